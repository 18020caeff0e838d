use planmd::{Block, InlineRun, ListItem, Marks, parse, serialize};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn heading_level_from_hash_count() {
    assert_eq!(parse("### Hello"), vec![Block::heading(3, "Hello")]);
    assert_eq!(serialize(&[Block::heading(3, "Hello")]), "### Hello");
    assert_eq!(Block::heading(3, "Hello").to_string(), "### Hello\n\n");
}

#[test]
fn heading_level_is_not_clamped() {
    assert_eq!(
        parse("########## Deep"),
        vec![Block::heading(10, "Deep")]
    );
}

#[test]
fn very_deep_heading_survives_normalization() {
    let source = format!("{} Deep", "#".repeat(300));
    assert_eq!(parse(&source), vec![Block::heading(300, "Deep")]);
    assert_eq!(serialize(&parse(&source)), source);
}

#[test]
fn ordered_marker_needs_ascii_digits() {
    assert_eq!(
        parse("\u{0661}. item"),
        vec![Block::paragraph("\u{0661}. item")]
    );
    assert_eq!(parse("12. item"), vec![Block::ordered_list(["item"])]);
}

#[test]
fn trailing_empty_marker_loses_its_space() {
    // The final trim eats the space after an empty last marker, so the
    // line no longer reads as the same block.
    let blocks = vec![Block::bullet_list(["x", ""])];
    let normalized = serialize(&blocks);
    assert_eq!(normalized, "- x\n-");
    assert_eq!(
        parse(&normalized),
        vec![Block::bullet_list(["x"]), Block::paragraph("-")]
    );
}

#[test]
fn heading_without_space_keeps_text() {
    assert_eq!(parse("#Tag"), vec![Block::heading(1, "Tag")]);
}

#[test]
fn blank_line_closes_bullet_list() {
    assert_eq!(
        parse("- a\n- b\n\ntext"),
        vec![Block::bullet_list(["a", "b"]), Block::paragraph("text")]
    );
}

#[test]
fn bullet_markers_merge_into_one_list() {
    assert_eq!(
        parse("- a\n* b\n- c"),
        vec![Block::bullet_list(["a", "b", "c"])]
    );
}

#[test]
fn non_list_line_closes_list() {
    assert_eq!(
        parse("- a\nplain\n- b"),
        vec![
            Block::bullet_list(["a"]),
            Block::paragraph("plain"),
            Block::bullet_list(["b"]),
        ]
    );
}

#[test]
fn switching_list_kind_opens_new_list() {
    assert_eq!(
        parse("- a\n1. b\n2. c"),
        vec![Block::bullet_list(["a"]), Block::ordered_list(["b", "c"])]
    );
}

#[test]
fn ordered_items_are_renumbered_on_serialize() {
    let blocks = parse("3. first\n7. second");
    assert_eq!(blocks, vec![Block::ordered_list(["first", "second"])]);
    assert_eq!(serialize(&blocks), "1. first\n2. second");
}

#[test]
fn code_fence_keeps_lines_verbatim() {
    let src = "```rust\nfn main() {}\n# not a heading\n- not a list\n```\nafter";
    assert_eq!(
        parse(src),
        vec![
            Block::code_block("fn main() {}\n# not a heading\n- not a list"),
            Block::paragraph("after"),
        ]
    );
}

#[test]
fn unterminated_code_fence_closes_at_end() {
    assert_eq!(
        parse("```\nlet x = 1;\n\n"),
        vec![Block::code_block("let x = 1;")]
    );
}

#[test]
fn dividers_and_quotes() {
    assert_eq!(
        parse("---\n***\n> quoted\n> second"),
        vec![
            Block::Divider,
            Block::Divider,
            Block::blockquote("quoted"),
            Block::blockquote("second"),
        ]
    );
}

#[test]
fn inline_markup_is_not_reinterpreted() {
    assert_eq!(parse("**bold** text"), vec![Block::paragraph("**bold** text")]);
}

#[test]
fn blank_lines_never_produce_paragraphs() {
    assert_eq!(parse("\n\n   \n"), Vec::<Block>::new());
}

#[test]
fn marks_wrap_in_fixed_order() {
    let all = Marks {
        bold: true,
        italic: true,
        code: true,
    };
    let blocks = vec![Block::Paragraph {
        content: vec![
            InlineRun::plain("plain "),
            InlineRun::marked("b", Marks { bold: true, ..Marks::NONE }),
            InlineRun::plain(" "),
            InlineRun::marked("all", all),
        ],
    }];
    assert_eq!(serialize(&blocks), "plain **b** `***all***`");
}

#[test]
fn empty_paragraph_keeps_a_line() {
    let blocks = vec![
        Block::paragraph("one"),
        Block::Paragraph { content: vec![] },
        Block::paragraph("two"),
    ];
    assert_eq!(serialize(&blocks), "one\n\n\ntwo");
}

#[test]
fn unsupported_blocks_are_dropped() {
    let blocks = vec![
        Block::heading(1, "Plan"),
        Block::Unsupported {
            kind: "table".into(),
        },
        Block::paragraph("body"),
    ];
    assert_eq!(serialize(&blocks), "# Plan\n\nbody");
}

#[test]
fn list_items_serialize_first_text_only() {
    let item = ListItem {
        content: vec![InlineRun::plain("head"), InlineRun::plain(" tail")],
        children: vec![Block::bullet_list(["nested"])],
    };
    let blocks = vec![Block::BulletList { items: vec![item] }];
    assert_eq!(serialize(&blocks), "- head");
}

#[test]
fn blockquote_serializes_first_text_only() {
    let blocks = vec![Block::Blockquote {
        content: vec![InlineRun::plain("said"), InlineRun::plain(" more")],
    }];
    assert_eq!(serialize(&blocks), "> said");
}

#[test]
fn full_document_serializes_in_order() {
    let blocks = vec![
        Block::heading(1, "Problem"),
        Block::paragraph("Customers wait too long."),
        Block::bullet_list(["slow", "costly"]),
        Block::ordered_list(["measure", "fix"]),
        Block::code_block("x = 1"),
        Block::blockquote("a quote"),
        Block::Divider,
        Block::heading(2, "Detail"),
    ];
    let expected = "# Problem\n\n\
        Customers wait too long.\n\n\
        - slow\n- costly\n\n\
        1. measure\n2. fix\n\n\
        ```\nx = 1\n```\n\n\
        > a quote\n\n\
        ---\n\n\
        ## Detail";
    assert_eq!(serialize(&blocks), expected);
    assert_eq!(parse(expected), blocks);
}

#[test]
fn blocks_serialize_to_tagged_json() {
    let json = serde_json::to_value(Block::heading(2, "Team")).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "type": "heading", "level": 2, "text": "Team" })
    );

    let back: Block = serde_json::from_value(serde_json::json!({
        "type": "paragraph",
        "content": [{ "text": "hi", "marks": { "bold": true } }]
    }))
    .unwrap();
    assert_eq!(
        back,
        Block::Paragraph {
            content: vec![InlineRun::marked("hi", Marks { bold: true, ..Marks::NONE })],
        }
    );
}

fn text() -> impl Strategy<Value = String> {
    "[a-z][a-z ]{0,12}[a-z]"
}

fn supported_block() -> impl Strategy<Value = Block> {
    prop_oneof![
        (1usize..=3, text()).prop_map(|(level, t)| Block::heading(level, t)),
        text().prop_map(Block::paragraph),
        prop::collection::vec(text(), 1..4).prop_map(Block::bullet_list),
        prop::collection::vec(text(), 1..4).prop_map(Block::ordered_list),
        prop::collection::vec(text(), 1..4).prop_map(|lines| Block::code_block(lines.join("\n"))),
        text().prop_map(Block::blockquote),
        Just(Block::Divider),
    ]
}

proptest! {
    #[test]
    fn prop_supported_blocks_round_trip(blocks in prop::collection::vec(supported_block(), 0..12)) {
        prop_assert_eq!(parse(&serialize(&blocks)), blocks);
    }
}
