//! Selections compiled from decoded schema payloads.

use codec::PropInterest;
use proptest::prelude::*;
use schema::{
    decode_class_info, decode_send_tables, encode_class_info, encode_send_tables, ClassTable,
    PropDef, PropType, SchemaLimits, Serializer,
};
use selection::{ColumnSource, Selection, SelectionRequest};

fn decoded_classes() -> ClassTable {
    let serializers = vec![
        Serializer::new(
            "CCSPlayerController",
            vec![
                PropDef::new("m_iszPlayerName", PropType::String),
                PropDef::new("m_steamID", PropType::UInt64),
                PropDef::new("m_hPlayerPawn", PropType::Handle),
            ],
        ),
        Serializer::new(
            "CCSPlayerPawn",
            vec![
                PropDef::new("m_vecOrigin", PropType::Vector3),
                PropDef::new("m_iHealth", PropType::VarUInt),
                PropDef::new("m_ArmorValue", PropType::VarUInt),
            ],
        ),
    ];
    let tables = encode_send_tables(&serializers).unwrap();
    let info = encode_class_info(&[(7, "CCSPlayerController"), (9, "CCSPlayerPawn")]).unwrap();
    let limits = SchemaLimits::default();

    let mut classes = ClassTable::new();
    classes.add_serializers(decode_send_tables(&tables, 0, &limits).unwrap());
    let _ = classes.bind_classes(decode_class_info(&info, 0, &limits).unwrap());
    classes
}

const NAMES: &[&str] = &[
    "X",
    "Y",
    "Z",
    "health",
    "armor_value",
    "m_iszPlayerName",
    "m_bogus",
    "team_num",
];

#[test]
fn compiled_from_decoded_tables() {
    let request = SelectionRequest {
        player_props: vec!["armor_value".into(), "Z".into()],
        ..SelectionRequest::default()
    };
    let selection = Selection::compile(&decoded_classes(), &request);
    let columns = selection.player_columns();
    assert_eq!(columns[0].source, ColumnSource::Pawn(2));
    assert_eq!(columns[1].source, ColumnSource::Pawn(0));
    assert_eq!(columns[1].component, Some(2));
    assert_eq!(selection.identity().controller_class, Some(7));
    assert_eq!(selection.identity().pawn_class, Some(9));
}

proptest! {
    #[test]
    fn compile_is_deterministic_and_columns_subset_request(
        picks in proptest::collection::vec(0usize..NAMES.len(), 0..10),
    ) {
        let classes = decoded_classes();
        let request = SelectionRequest {
            player_props: picks.iter().map(|i| NAMES[*i].to_string()).collect(),
            ..SelectionRequest::default()
        };
        let first = Selection::compile(&classes, &request);
        let second = Selection::compile(&classes, &request);
        prop_assert_eq!(first.player_columns(), second.player_columns());
        prop_assert_eq!(first.invalid(), second.invalid());

        for column in first.player_columns() {
            prop_assert!(request.player_props.contains(&column.name));
        }
        for name in first.invalid() {
            prop_assert!(request.player_props.contains(name));
        }
        for class_id in [7, 9] {
            for index in 0..3 {
                prop_assert_eq!(first.wants(class_id, index), second.wants(class_id, index));
            }
        }
    }
}
