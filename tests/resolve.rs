//! End-to-end position queries over documents built from heap records.

use std::{io::Write, sync::Arc};

use heapscope::prelude::*;

/// Groups only the `Length` field of `#US` records
struct LengthOnly;

impl StructureInfoProvider for LengthOnly {
    fn sub_structure_indexes(
        &self,
        _file: &HexFile,
        structure: &dyn Structure,
        _position: Position,
    ) -> Option<Vec<HexIndexes>> {
        structure
            .as_any()
            .downcast_ref::<UserStringRecord>()
            .map(|_| vec![HexIndexes::single(0)])
    }
}

#[rustfmt::skip]
fn bytes() -> Vec<u8> {
    let mut data = vec![0u8; 128];
    // #Blob entry at 50: length 4, data DE AD BE EF
    data[50..55].copy_from_slice(&[0x04, 0xDE, 0xAD, 0xBE, 0xEF]);
    // #US entry at 60: length 5, "Hi", terminal byte 0
    data[60..66].copy_from_slice(&[0x05, b'H', 0x00, b'i', 0x00, 0x00]);
    // #Strings entry at 100: "Hello\0"
    data[100..106].copy_from_slice(b"Hello\0");
    data
}

fn document() -> Document {
    let data = bytes();

    let blob_heap = Arc::new(HeapInfo::new(HeapKind::Blob, Span::new(48, 56)));
    let us_heap = Arc::new(HeapInfo::new(HeapKind::UserStrings, Span::new(56, 72)));
    let strings_heap = Arc::new(HeapInfo::new(HeapKind::Strings, Span::new(96, 112)));

    let mut structures = StructureList::new();
    structures
        .push(Box::new(
            BlobRecord::new(blob_heap, &data, Span::new(50, 55), Span::new(50, 51), Token::NULL)
                .unwrap(),
        ))
        .unwrap();
    structures
        .push(Box::new(
            UserStringRecord::new(
                us_heap,
                &data,
                Span::new(60, 61),
                Span::new(61, 65),
                Span::new(65, 66),
            )
            .unwrap(),
        ))
        .unwrap();
    structures
        .push(Box::new(
            StringsRecord::new(
                strings_heap,
                &data,
                Span::new(100, 105),
                true,
                vec![Token(0x0200_0001)],
            )
            .unwrap(),
        ))
        .unwrap();

    let file = HexFile::new("metadata", Span::new(0, 128))
        .with_container(Box::new(structures))
        .unwrap();
    Document::new(Buffer::from_mem(data).unwrap(), vec![file]).unwrap()
}

fn heap_service() -> StructureInfoService {
    StructureInfoService::new(vec![ProviderRegistration::with_instance(
        "heaps",
        0,
        Arc::new(HeapRecordInfoProvider::new()),
    )])
}

#[test]
fn strings_record_falls_back_to_structure() {
    let document = document();
    let fields = heap_service().get_fields(&document, Position(102));

    assert_eq!(
        fields,
        vec![
            FieldHighlight::new(Span::new(100, 105), FieldKind::CurrentField),
            FieldHighlight::new(Span::new(100, 106), FieldKind::Structure),
        ]
    );
}

#[test]
fn blob_length_is_current_field() {
    let document = document();
    let service = heap_service();

    let fields = service.get_fields(&document, Position(50));
    assert_eq!(
        fields[0],
        FieldHighlight::new(Span::new(50, 51), FieldKind::CurrentField)
    );

    let resolved = service.resolve(&document, Position(50)).unwrap();
    let record = resolved
        .structure
        .as_any()
        .downcast_ref::<BlobRecord>()
        .unwrap();
    assert_eq!(record.length(), 4);
    assert_eq!(record.data(), &[0xDE, 0xAD, 0xBE, 0xEF]);

    // the blob has no explicit owner
    assert!(service.reference(&document, Position(52)).is_none());
}

#[test]
fn provider_groups_user_string_length() {
    let document = document();
    let service = StructureInfoService::new(vec![
        ProviderRegistration::new("length", 1, || {
            Arc::new(LengthOnly) as Arc<dyn StructureInfoProvider>
        }),
        ProviderRegistration::with_instance("heaps", 2, Arc::new(HeapRecordInfoProvider::new())),
    ]);

    let fields = service.get_fields(&document, Position(62));
    assert_eq!(
        fields,
        vec![
            FieldHighlight::new(Span::new(61, 65), FieldKind::CurrentField),
            FieldHighlight::new(Span::new(60, 61), FieldKind::SubStructure),
        ]
    );

    // records the provider does not know keep the fallback
    let fields = service.get_fields(&document, Position(102));
    assert_eq!(fields[1].kind, FieldKind::Structure);
}

#[test]
fn unstructured_bytes() {
    let document = document();
    let service = heap_service();

    assert!(service.get_fields(&document, Position(0)).is_empty());
    assert!(service.get_fields(&document, Position(56)).is_empty());
    assert!(service.get_fields(&document, Position(1000)).is_empty());
    assert!(service.tooltip(&document, Position(0)).is_none());
}

#[test]
fn tooltip_and_reference() {
    let document = document();
    let service = heap_service();

    let tooltip = service.tooltip(&document, Position(105)).unwrap();
    assert_eq!(
        tooltip.downcast_ref::<String>().unwrap(),
        "#Strings[0x4] StringsRecord\nTerminator: 0x00"
    );

    let tooltip = service.tooltip(&document, Position(63)).unwrap();
    assert_eq!(
        tooltip.downcast_ref::<String>().unwrap(),
        "#US[0x4] UserStringRecord\nString: \"Hi\""
    );

    let reference = service.reference(&document, Position(101)).unwrap();
    assert_eq!(
        reference.downcast_ref::<Vec<Token>>().unwrap(),
        &vec![Token(0x0200_0001)]
    );
}

#[test]
fn nested_file_without_structures() {
    let data = bytes();
    let strings = StringsHeap::parse(&data, Span::new(100, 106), &HeapReferences::new()).unwrap();

    // the resource covers the string but describes nothing
    let file = HexFile::new("metadata", Span::new(0, 128))
        .with_container(Box::new(strings))
        .unwrap()
        .with_nested(HexFile::new("resource", Span::new(96, 112)))
        .unwrap();
    let document = Document::new(Buffer::from_mem(data).unwrap(), vec![file]).unwrap();

    assert_eq!(document.file_at(Position(102), true).unwrap().name(), "resource");

    let service = StructureInfoService::new(vec![]);
    let resolved = service.resolve(&document, Position(102)).unwrap();
    assert_eq!(resolved.file.name(), "metadata");
    assert_eq!(resolved.structure.name(), "StringsRecord");
}

#[test]
fn structures_of_nested_files() {
    let data = bytes();
    let strings = StringsHeap::parse(&data, Span::new(100, 106), &HeapReferences::new()).unwrap();

    let resource = HexFile::new("resource", Span::new(96, 112))
        .with_container(Box::new(strings))
        .unwrap();
    let file = HexFile::new("metadata", Span::new(0, 128))
        .with_nested(resource)
        .unwrap();
    let document = Document::new(Buffer::from_mem(data).unwrap(), vec![file]).unwrap();

    let fields = StructureInfoService::new(vec![]).get_fields(&document, Position(102));
    assert_eq!(fields[0].span, Span::new(100, 105));

    let shallow = StructureInfoService::with_config(vec![], ServiceConfig::shallow());
    assert!(shallow.get_fields(&document, Position(102)).is_empty());
}

#[test]
fn mapped_heaps() {
    #[rustfmt::skip]
    let data: [u8; 24] = [
        // #Strings: "", "Main"
        0x00, b'M', b'a', b'i', b'n', 0x00,
        // #Blob: empty, [0x01 0x02]
        0x00, 0x02, 0x01, 0x02,
        // #US: empty, "A"
        0x00, 0x03, b'A', 0x00, 0x00,
        // padding
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    let mut temp = tempfile::NamedTempFile::new().unwrap();
    temp.write_all(&data).unwrap();
    temp.flush().unwrap();

    let buffer = Buffer::from_file(temp.path()).unwrap();
    let mut references = HeapReferences::new();
    references.add(1, Token(0x1100_0001));

    let strings =
        StringsHeap::parse(buffer.data(), Span::new(0, 6), &HeapReferences::new()).unwrap();
    let blobs = BlobHeap::parse(buffer.data(), Span::new(6, 10), &references).unwrap();
    let user_strings = UserStringsHeap::parse(buffer.data(), Span::new(10, 15)).unwrap();
    assert_eq!(strings.records().len(), 2);
    assert_eq!(blobs.records().len(), 2);
    assert_eq!(user_strings.records().len(), 2);

    let file = HexFile::new("metadata", Span::new(0, 24))
        .with_container(Box::new(strings))
        .unwrap()
        .with_container(Box::new(blobs))
        .unwrap()
        .with_container(Box::new(user_strings))
        .unwrap();
    let document = Document::new(buffer, vec![file]).unwrap();
    let service = heap_service();

    let fields = service.get_fields(&document, Position(9));
    assert_eq!(fields[0].span, Span::new(8, 10));
    assert_eq!(fields[1], FieldHighlight::new(Span::new(7, 10), FieldKind::Structure));

    let owner = service.reference(&document, Position(8)).unwrap();
    assert_eq!(owner.downcast_ref::<Token>(), Some(&Token(0x1100_0001)));

    let fields = service.get_fields(&document, Position(12));
    assert_eq!(fields[0].span, Span::new(12, 14));
    assert!(service.get_fields(&document, Position(20)).is_empty());
}
