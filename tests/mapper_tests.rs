//! End-to-end mapping tests: full documents walked against full schemas.

use schemap::{load_path, load_reader, load_str, Entry, MapError, MapErrorKind, Mapping, OneOf, Scalar, Schema, Sequence, Value};

fn string_map(entries: &[(&str, Value)]) -> Value {
    Value::Map(
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    )
}

#[cfg(test)]
mod scenarios {
    use super::*;

    fn command_schema() -> Mapping {
        Mapping::new()
            .required("command", Scalar::string())
            .unwrap()
            .optional("arguments", Sequence::new().can_contain(Scalar::string()))
            .unwrap()
            .optional(
                "env",
                Mapping::new()
                    .zero_or_more("[A-Z]+", Scalar::string())
                    .unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn command_document_resolves() {
        let yaml = "command: /bin/echo\narguments:\n  - a\n  - b\nenv: { NAME: Bob }\n";
        let value = load_str(command_schema(), yaml).unwrap();
        assert_eq!(
            value,
            string_map(&[
                ("command", Value::String("/bin/echo".to_string())),
                (
                    "arguments",
                    Value::List(vec!["a".into(), "b".into()])
                ),
                ("env", string_map(&[("NAME", "Bob".into())])),
            ])
        );
    }

    #[test]
    fn missing_required_command_fails() {
        let err = load_str(command_schema(), "arguments: [a]\n").unwrap_err();
        match err.kind() {
            MapErrorKind::RequiredKeyMissing { keys } => assert!(keys.contains("command")),
            other => panic!("expected RequiredKeyMissing, got {other:?}"),
        }
    }

    #[test]
    fn squashed_wrapper_key_is_discarded() {
        let inner = Mapping::new().zero_or_more(".+", Scalar::string()).unwrap();
        let schema = Mapping::new()
            .exactly_one(r"item\d", inner)
            .unwrap()
            .squash()
            .unwrap();

        let value = load_str(schema.clone(), "item1:\n  a: A\n  b: B\n").unwrap();
        assert_eq!(value, string_map(&[("a", "A".into()), ("b", "B".into())]));

        let err = load_str(schema.clone(), "{}").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::RequiredKeyMissing { .. }));

        let err = load_str(schema, "item1:\n  a: A\nitem2:\n  b: B\n").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::TooManyOccurrences { .. }));
    }

    #[test]
    fn pipeline_of_alternatives_resolves_each_item() {
        let bare = Scalar::string().transform(|value| match value {
            Value::String(name) => Ok(Value::List(vec![Value::String(name)])),
            other => Ok(other),
        });
        let call = Mapping::new()
            .exactly_one(".+", Sequence::new().can_contain(Scalar::any()))
            .unwrap()
            .unpack_into(|mut pairs| {
                let (name, args) = pairs
                    .pop()
                    .ok_or_else(|| MapError::custom("call mapping is empty"))?;
                let mut step = vec![Value::String(name)];
                match args {
                    Value::List(items) => step.extend(items),
                    other => step.push(other),
                }
                Ok(Value::List(step))
            })
            .unwrap();
        let schema = Sequence::new().can_contain(bare).can_contain(call);

        let value = load_str(schema, "- upper\n- replace: [X, Y]\n").unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::List(vec!["upper".into()]),
                Value::List(vec!["replace".into(), "X".into(), "Y".into()]),
            ])
        );
    }
}

#[cfg(test)]
mod cardinality {
    use super::*;

    #[test]
    fn non_repeatable_key_appearing_twice_fails() {
        let schema = Mapping::new().optional("name", Scalar::string()).unwrap();
        let err = load_str(schema, "name: a\nname: b\n").unwrap_err();
        match err.kind() {
            MapErrorKind::TooManyOccurrences { keys } => assert!(keys.contains("name")),
            other => panic!("expected TooManyOccurrences, got {other:?}"),
        }
    }

    #[test]
    fn repeatable_required_rule() {
        let schema = Mapping::new().one_or_more("arg", Scalar::string()).unwrap();

        let err = load_str(schema.clone(), "{}").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::RequiredKeyMissing { .. }));

        let value = load_str(schema, "arg: a\narg: b\n").unwrap();
        assert_eq!(value, string_map(&[("arg", "a".into()), ("arg", "b".into())]));
    }

    #[test]
    fn cardinality_is_checked_after_the_whole_mapping() {
        // The required key is present further down; scanning must not fail
        // before having seen it.
        let schema = Mapping::new()
            .required("last", Scalar::string())
            .unwrap()
            .zero_or_more("[a-z]+", Scalar::any())
            .unwrap();
        let value = load_str(schema, "other: 1\nlast: x\n").unwrap();
        assert_eq!(value.get("last"), Some(&Value::String("x".to_string())));
    }

    #[test]
    fn duplicate_keys_from_repeatable_rules_are_retained_in_order() {
        let schema = Mapping::new().zero_or_more(".+", Scalar::any()).unwrap();
        let value = load_str(schema, "k: 1\nj: 2\nk: 3\n").unwrap();
        assert_eq!(
            value,
            string_map(&[
                ("k", Value::Int(1)),
                ("j", Value::Int(2)),
                ("k", Value::Int(3)),
            ])
        );
    }
}

#[cfg(test)]
mod alternation {
    use super::*;

    fn tagging(label: &'static str) -> Scalar {
        Scalar::string().transform(move |value| match value {
            Value::String(s) => Ok(Value::String(format!("{label}:{s}"))),
            other => Ok(other),
        })
    }

    #[test]
    fn first_matching_candidate_wins() {
        let schema = OneOf::new().case(tagging("a")).case(tagging("b"));
        let value = load_str(schema, "hello").unwrap();
        assert_eq!(value, Value::String("a:hello".to_string()));
    }

    #[test]
    fn swapping_candidates_changes_the_constructor() {
        let schema = OneOf::new().case(tagging("b")).case(tagging("a"));
        let value = load_str(schema, "hello").unwrap();
        assert_eq!(value, Value::String("b:hello".to_string()));
    }

    #[test]
    fn no_candidate_at_all_is_a_structural_error() {
        let schema = OneOf::new().case(Scalar::integer()).case(Scalar::boolean());
        let err = load_str(schema, "hello").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::NoMatchingType));
    }
}

#[cfg(test)]
mod sequences {
    use super::*;

    #[test]
    fn order_is_preserved() {
        let schema = Sequence::new().can_contain(Scalar::string());
        let value = load_str(schema, "- a\n- b\n- c\n- d\n- e\n").unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                "a".into(),
                "b".into(),
                "c".into(),
                "d".into(),
                "e".into()
            ])
        );
    }

    #[test]
    fn empty_sequence_resolves_to_empty_list() {
        let schema = Sequence::new().can_contain(Scalar::string());
        assert_eq!(load_str(schema, "[]").unwrap(), Value::List(vec![]));
    }

    #[test]
    fn one_unmatchable_item_fails_the_whole_sequence() {
        let schema = Sequence::new().can_contain(Scalar::string());
        let err = load_str(schema, "- a\n- [nested]\n").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::NoMatchingType));
    }

    #[test]
    fn build_with_spreads_items_into_a_factory() {
        let schema = Sequence::new()
            .can_contain(Scalar::integer())
            .build_with(|items| {
                let sum = items.iter().filter_map(Value::as_int).sum();
                Ok(Value::Int(sum))
            });
        assert_eq!(load_str(schema, "[1, 2, 3]").unwrap(), Value::Int(6));
    }
}

#[cfg(test)]
mod mappings {
    use super::*;

    #[test]
    fn unknown_key_fails_at_the_key_node() {
        let schema = Mapping::new().required("command", Scalar::string()).unwrap();
        let err = load_str(schema, "command: a\nextra: b\n").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::NoMatchingType));
        assert_eq!(err.span().unwrap().start.line, 2);
    }

    #[test]
    fn key_pattern_hit_with_value_miss_is_no_match() {
        let schema = Mapping::new().required("command", Scalar::string()).unwrap();
        let err = load_str(schema, "command: [not, a, string]\n").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::NoMatchingType));
    }

    #[test]
    fn value_schema_decides_between_overlapping_rules() {
        let schema = Mapping::new()
            .zero_or_more(".+", Scalar::integer())
            .unwrap()
            .zero_or_more(".+", Scalar::string())
            .unwrap();
        let value = load_str(schema, "a: 1\nb: hello\n").unwrap();
        assert_eq!(value.get("a"), Some(&Value::Int(1)));
        assert_eq!(value.get("b"), Some(&Value::String("hello".to_string())));
    }

    #[test]
    fn non_string_key_is_rejected() {
        let schema = Mapping::new().zero_or_more(".+", Scalar::any()).unwrap();
        let err = load_str(schema, "1: x\n").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::NonStringKey));
    }

    #[test]
    fn multi_pattern_entry_reports_its_pattern_set() {
        let entry = Entry::new(true, false)
            .case("x", Scalar::any())
            .unwrap()
            .case("y", Scalar::any())
            .unwrap();
        let err = load_str(Mapping::new().entry(entry), "{}").unwrap_err();
        assert!(err.to_string().contains("(x | y)"), "got: {err}");
    }

    #[test]
    fn custom_pair_constructor_and_list_output() {
        let entry = Entry::new(false, true)
            .case_with(r"item\d", Scalar::string(), |_key, value| value)
            .unwrap();
        let schema = Mapping::new()
            .entry(entry)
            .build_with(|children| Ok(Value::List(children)))
            .unwrap();
        let value = load_str(schema, "item1: a\nitem2: b\n").unwrap();
        assert_eq!(value, Value::List(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn unpack_into_receives_ordered_pairs() {
        let schema = Mapping::new()
            .required("a", Scalar::string())
            .unwrap()
            .optional("b", Scalar::string())
            .unwrap()
            .unpack_into(|pairs| {
                let rendered: Vec<String> =
                    pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
                Ok(Value::String(rendered.join(",")))
            })
            .unwrap();

        let value = load_str(schema.clone(), "a: A1\nb: B1\n").unwrap();
        assert_eq!(value, Value::String("a=A1,b=B1".to_string()));

        let value = load_str(schema, "a: A2\n").unwrap();
        assert_eq!(value, Value::String("a=A2".to_string()));
    }

    #[test]
    fn squash_requires_a_singleton() {
        let schema = Mapping::new()
            .zero_or_more(r"item\d", Scalar::string())
            .unwrap()
            .squash()
            .unwrap();

        let err = load_str(schema.clone(), "item1: a\nitem2: b\n").unwrap_err();
        assert!(matches!(
            err.kind(),
            MapErrorKind::NotSingleton { count: 2 }
        ));

        let err = load_str(schema, "{}").unwrap_err();
        assert!(matches!(
            err.kind(),
            MapErrorKind::NotSingleton { count: 0 }
        ));
    }
}

#[cfg(test)]
mod scalars {
    use super::*;

    fn roundtrip(yaml: &str) -> Value {
        load_str(Scalar::any(), yaml).unwrap()
    }

    #[test]
    fn default_construction_follows_the_tag() {
        assert_eq!(roundtrip("hello"), Value::String("hello".to_string()));
        assert_eq!(roundtrip("42"), Value::Int(42));
        assert_eq!(roundtrip("-3"), Value::Int(-3));
        assert_eq!(roundtrip("0x1A"), Value::Int(26));
        assert_eq!(roundtrip("0o17"), Value::Int(15));
        assert_eq!(roundtrip("1.5"), Value::Float(1.5));
        assert_eq!(roundtrip("1e3"), Value::Float(1000.0));
        assert_eq!(roundtrip("true"), Value::Bool(true));
        assert_eq!(roundtrip("False"), Value::Bool(false));
        assert_eq!(roundtrip("~"), Value::Null);
        assert_eq!(roundtrip(".inf"), Value::Float(f64::INFINITY));
        assert!(matches!(roundtrip(".nan"), Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn quoted_numbers_stay_strings() {
        assert_eq!(roundtrip("'5'"), Value::String("5".to_string()));
        assert_eq!(roundtrip("\"true\""), Value::String("true".to_string()));
    }

    #[test]
    fn explicit_str_tag_overrides_resolution() {
        assert_eq!(roundtrip("!!str 5"), Value::String("5".to_string()));
    }

    #[test]
    fn explicit_tag_with_unparsable_text_fails_construction() {
        let err = load_str(Scalar::integer(), "!!int abc").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::InvalidScalar { .. }));
    }

    #[test]
    fn custom_constructor_replaces_the_default() {
        let schema = Scalar::string().construct_with(|node| {
            Ok(Value::Int(node.scalar_text().map_or(0, str::len) as i64))
        });
        assert_eq!(load_str(schema, "hello").unwrap(), Value::Int(5));
    }

    #[test]
    fn value_pattern_constrains_matching() {
        let schema = Mapping::new()
            .zero_or_more(".+", Scalar::string().matching("[A-Z]+").unwrap())
            .unwrap();
        assert!(load_str(schema.clone(), "k: ABC\n").is_ok());
        let err = load_str(schema, "k: abc\n").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::NoMatchingType));
    }
}

#[cfg(test)]
mod documents {
    use super::*;

    #[test]
    fn aliases_resolve_independently_per_reference() {
        let inner = Mapping::new().zero_or_more(".+", Scalar::string()).unwrap();
        let schema = Mapping::new().zero_or_more(".+", inner).unwrap();
        let value = load_str(schema, "base: &b\n  x: X\nother: *b\n").unwrap();
        assert_eq!(value.get("base"), value.get("other"));
        assert_eq!(
            value.get("base").unwrap().get("x"),
            Some(&Value::String("X".to_string()))
        );
    }

    #[test]
    fn empty_input_has_no_root() {
        let err = load_str(Scalar::any(), "").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::EmptyDocument));
        let err = load_str(Scalar::any(), "# only a comment\n").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::EmptyDocument));
    }

    #[test]
    fn multiple_documents_are_rejected() {
        let err = load_str(Scalar::any(), "---\n1\n---\n2\n").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::MultipleDocuments));
    }

    #[test]
    fn scanner_failures_surface_as_scan_errors() {
        let schema = Mapping::new().zero_or_more(".+", Scalar::any()).unwrap();
        let err = load_str(schema, "foo: [unclosed\n").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::Scan(_)));
        assert!(err.to_string().contains("invalid document"));
    }

    #[test]
    fn load_reader_consumes_a_stream() {
        let schema = Mapping::new().required("k", Scalar::integer()).unwrap();
        let value = load_reader(schema, "k: 7\n".as_bytes()).unwrap();
        assert_eq!(value.get("k"), Some(&Value::Int(7)));
    }

    #[test]
    fn load_path_reads_a_file() {
        let path = std::env::temp_dir().join(format!("schemap-test-{}.yaml", std::process::id()));
        std::fs::write(&path, "k: 7\n").unwrap();
        let schema = Mapping::new().required("k", Scalar::integer()).unwrap();
        let value = load_path(schema, &path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(value.get("k"), Some(&Value::Int(7)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_path(Scalar::any(), "/nonexistent/schemap.yaml").unwrap_err();
        assert!(matches!(err.kind(), MapErrorKind::Io(_)));
    }
}

#[cfg(test)]
mod diagnostics {
    use super::*;

    #[test]
    fn errors_carry_the_offending_position() {
        let schema = Mapping::new().required("command", Scalar::string()).unwrap();
        let err = load_str(schema, "command: a\nextra: b\n").unwrap_err();
        let span = err.span().unwrap();
        assert_eq!(span.start.line, 2);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn error_categories_separate_shape_from_document_problems() {
        use schemap::ErrorCategory;
        let err = load_str(Scalar::string(), "[a]").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Structure);
        let err = load_str(Scalar::string(), "").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Document);
    }

    #[test]
    fn errors_render_as_miette_reports() {
        let err = load_str(Scalar::string(), "[a]").unwrap_err();
        let report = miette::Report::new(err);
        let rendered = format!("{report:?}");
        assert!(rendered.contains("found no matching type"), "got: {rendered}");
    }

    #[test]
    fn mapped_values_serialize() {
        let schema = Mapping::new()
            .required("command", Scalar::string())
            .unwrap()
            .optional("count", Scalar::integer())
            .unwrap();
        let value = load_str(schema, "command: /bin/echo\ncount: 2\n").unwrap();
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["command"], "/bin/echo");
        assert_eq!(json["count"], 2);
    }
}

#[cfg(test)]
mod depth {
    use super::*;

    #[test]
    fn deeply_nested_documents_do_not_overflow() {
        // The evaluator never recurses; the generous thread stack is for
        // dropping the nested result value, which is plain data.
        let handle = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| {
                const DEPTH: usize = 10_000;
                let mut schema = Schema::from(Sequence::new());
                for _ in 0..DEPTH - 1 {
                    schema = Sequence::new().can_contain(schema).into();
                }
                let source = format!("{}{}", "[".repeat(DEPTH), "]".repeat(DEPTH));
                let value = load_str(schema, &source).unwrap();

                let mut depth = 0;
                let mut cursor = &value;
                while let Value::List(items) = cursor {
                    depth += 1;
                    match items.first() {
                        Some(item) => cursor = item,
                        None => break,
                    }
                }
                assert_eq!(depth, DEPTH);
            })
            .unwrap();
        handle.join().unwrap();
    }
}
