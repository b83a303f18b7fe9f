//! Tests for instruction parsing.

use rstest::rstest;

use super::*;
use crate::codec::pack;

fn entry(fields: &[&str]) -> Item {
    Item::List(fields.iter().copied().map(Item::from).collect())
}

fn parse_one(fields: &[&str]) -> ParsedInstruction {
    let mut parsed = parse_batch(vec![entry(fields)]);
    assert_eq!(parsed.len(), 1);
    parsed.remove(0)
}

#[test]
fn parses_every_kind() {
    let document = pack(&[
        entry(&["i", "import", "slim.examples"]),
        entry(&["m", "make", "milk", "ShouldIBuyMilk", "7"]),
        entry(&["c", "call", "milk", "goToStore"]),
        entry(&["ca", "callAndAssign", "r", "milk", "cashInWallet", "2"]),
        entry(&["a", "assign", "total", "12"]),
    ]);
    let parsed: Vec<Instruction> = parse(&document)
        .expect("document decodes")
        .into_iter()
        .collect::<Result<_, _>>()
        .expect("all entries are well formed");

    let kinds: Vec<InstructionKind> = parsed.iter().map(|i| i.operation.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            InstructionKind::Import,
            InstructionKind::Make,
            InstructionKind::Call,
            InstructionKind::CallAndAssign,
            InstructionKind::Assign,
        ]
    );
    assert_eq!(
        parsed.get(1).map(|i| &i.operation),
        Some(&Operation::Make {
            instance: "milk".to_owned(),
            class: "ShouldIBuyMilk".to_owned(),
            args: vec![Item::from("7")],
        })
    );
    assert_eq!(
        parsed.get(3).map(|i| &i.operation),
        Some(&Operation::CallAndAssign {
            symbol: "r".to_owned(),
            instance: "milk".to_owned(),
            method: "cashInWallet".to_owned(),
            args: vec![Item::from("2")],
        })
    );
}

#[test]
fn nested_arguments_are_kept_as_lists() {
    let row = Item::List(vec![Item::from("a"), Item::from("b")]);
    let parsed = parse_batch(vec![Item::List(vec![
        Item::from("t"),
        Item::from("call"),
        Item::from("table"),
        Item::from("doTable"),
        Item::List(vec![row.clone()]),
    ])]);
    let Some(Ok(Instruction {
        operation: Operation::Call { args, .. },
        ..
    })) = parsed.first()
    else {
        panic!("expected a call, got {parsed:?}");
    };
    assert_eq!(args, &vec![Item::List(vec![row])]);
}

#[rstest]
#[case::import_without_path(&["i", "import"], "import", 0)]
#[case::import_with_extra(&["i", "import", "a", "b"], "import", 2)]
#[case::make_without_class(&["m", "make", "x"], "make", 1)]
#[case::call_without_method(&["c", "call", "x"], "call", 1)]
#[case::call_and_assign_short(&["c", "callAndAssign", "s", "x"], "callAndAssign", 2)]
#[case::assign_without_value(&["a", "assign", "s"], "assign", 1)]
fn rejects_wrong_arity(#[case] fields: &[&str], #[case] keyword: &str, #[case] actual: usize) {
    let error = parse_one(fields).expect_err("wrong arity");
    assert_eq!(error.id, fields.first().copied().unwrap_or_default());
    let InstructionError::WrongArity {
        kind,
        actual: reported,
        ..
    } = error.error
    else {
        panic!("expected arity error, got {:?}", error.error);
    };
    assert_eq!(kind.as_str(), keyword);
    assert_eq!(reported, actual);
    assert_eq!(error.error.code(), "MALFORMED_INSTRUCTION");
}

#[test]
fn unknown_kind_is_an_invalid_statement() {
    let error = parse_one(&["x1", "explode", "now"]).expect_err("unknown kind");
    assert_eq!(error.id, "x1");
    assert_eq!(
        error.error,
        InstructionError::UnknownKind {
            kind: "explode".to_owned()
        }
    );
    assert_eq!(error.error.code(), "INVALID_STATEMENT");
}

#[test]
fn kind_keywords_are_case_sensitive() {
    assert!(parse_one(&["x", "Call", "a", "b"]).is_err());
    assert!(parse_one(&["x", "callandassign", "s", "a", "b"]).is_err());
}

#[test]
fn plain_text_entry_is_answered_with_empty_id() {
    let parsed = parse_batch(vec![Item::from("oops")]);
    assert_eq!(
        parsed,
        vec![Err(MalformedInstruction {
            id: String::new(),
            error: InstructionError::NotAList,
        })]
    );
}

#[test]
fn entry_with_only_an_id_keeps_the_id() {
    let error = parse_one(&["lonely"]).expect_err("missing kind");
    assert_eq!(error.id, "lonely");
    assert_eq!(error.error, InstructionError::MissingKind);
}

#[test]
fn list_valued_names_are_rejected() {
    let parsed = parse_batch(vec![Item::List(vec![
        Item::from("m"),
        Item::from("make"),
        Item::List(vec![]),
        Item::from("Echo"),
    ])]);
    assert_eq!(
        parsed,
        vec![Err(MalformedInstruction {
            id: "m".to_owned(),
            error: InstructionError::ExpectedText {
                kind: InstructionKind::Make,
                position: 0,
            },
        })]
    );
}

#[test]
fn malformed_entries_do_not_disturb_neighbours() {
    let parsed = parse_batch(vec![
        entry(&["1", "import", "a"]),
        entry(&["2", "bogus"]),
        entry(&["3", "assign", "s", "v"]),
    ]);
    let ids: Vec<&str> = parsed
        .iter()
        .map(|entry| match entry {
            Ok(instruction) => instruction.id.as_str(),
            Err(malformed) => malformed.id.as_str(),
        })
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert!(parsed.first().is_some_and(Result::is_ok));
    assert!(parsed.get(1).is_some_and(Result::is_err));
    assert!(parsed.get(2).is_some_and(Result::is_ok));
}

#[test]
fn undecodable_document_is_a_codec_error() {
    assert!(parse("not a list").is_err());
}
