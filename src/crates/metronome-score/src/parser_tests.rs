// Score documents exercising the parser end to end

#[cfg(test)]
mod tests {
    use crate::error::ParseError;
    use crate::node::Node;
    use crate::parser::{parse_meter, parse_score, ParserOptions, ScoreParser, MAX_REPETITIONS};
    use metronome_core::{Meter, MetricalDuration, Structure, Tempo};
    use proptest::prelude::*;

    // Helper to parse a YAML score, panicking on failure
    fn parse_yaml(source: &str) -> Structure {
        let value: serde_yaml::Value = serde_yaml::from_str(source).unwrap();
        match parse_score(&Node::from(value)) {
            Ok(structure) => structure,
            Err(e) => panic!("Failed to parse '{}': {}", source, e),
        }
    }

    // Helper to parse a JSON score and return the error
    fn parse_json_err(source: &str) -> ParseError {
        let value: serde_json::Value = serde_json::from_str(source).unwrap();
        match parse_score(&Node::from(value)) {
            Ok(_) => panic!("Expected parse to fail for '{}'", source),
            Err(e) => e,
        }
    }

    fn score(elements: Vec<Node>) -> Node {
        Node::List(elements)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_meter_strings() {
        assert_eq!(parse_meter("4/4"), Ok(Meter::new(4, 4)));
        assert_eq!(parse_meter("9/16"), Ok(Meter::new(9, 16)));
        assert_eq!(parse_meter("13/128"), Ok(Meter::new(13, 128)));
        assert_eq!(ScoreParser::parse_meter("7/8"), Ok(Meter::new(7, 8)));
    }

    #[test]
    fn test_ill_formed_meter_strings() {
        for text in ["12/13", "3,4", "3/4/4", "/4", "3/", "x/4", "0/4", "-3/4", "3/0", "3/-4", ""] {
            assert_eq!(
                parse_meter(text),
                Err(ParseError::IllFormedMeter(text.to_string())),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_meter_list_with_repetition() {
        let structure = parse_score(&score(vec![
            Node::from("4/4"),
            Node::from("9/16 x 10"),
            Node::from("13/128"),
        ]))
        .unwrap();

        let meters = structure.meters();
        assert_eq!(meters.len(), 12);
        assert_eq!(meters[0], Meter::new(4, 4));
        assert!(meters[1..11].iter().all(|meter| *meter == Meter::new(9, 16)));
        assert_eq!(meters[11], Meter::new(13, 128));
        assert_eq!(
            structure.offset_of_meter(11),
            Some(MetricalDuration::new(1, 1) + MetricalDuration::new(90, 16))
        );
    }

    #[test]
    fn test_ill_formed_repetition() {
        for text in ["3/4 x", "3/4 x 0", "3/4 y 2", "3/4 x 2 x", "3/4  x 2", "3/4 x -1", "3/5 x 2"] {
            let document = score(vec![Node::from(text)]);
            assert_eq!(
                parse_score(&document),
                Err(ParseError::IllFormedMeter(text.to_string())),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_meter_with_tempo() {
        let document = score(vec![Node::mapping([(
            "4/4",
            Node::mapping([("tempo", Node::Integer(120))]),
        )])]);
        let structure = parse_score(&document).unwrap();

        assert_eq!(structure.meters(), &[Meter::new(4, 4)]);
        let events = structure.tempi().events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].offset, MetricalDuration::ZERO);
        assert_eq!(events[0].tempo.beats_per_minute(), 120.0);
        assert_eq!(events[0].tempo.subdivision(), 4);
        assert!(!events[0].interpolating);
    }

    #[test]
    fn test_document_must_be_a_list() {
        let document = Node::mapping([("4/4", Node::Null)]);
        assert_eq!(
            ScoreParser::new(document.clone()).err(),
            Some(ParseError::IllFormedScore(document))
        );
        assert_eq!(
            ScoreParser::new("4/4").err(),
            Some(ParseError::IllFormedScore(Node::from("4/4")))
        );
    }

    #[test]
    fn test_ill_formed_tempo() {
        let error = parse_json_err(r#"[{"4/4": {"tempo": true}}]"#);
        assert_eq!(error, ParseError::IllFormedTempo(Node::Bool(true)));

        for tempo in [r#""fast""#, "0", "-60", "null", "[]"] {
            let error = parse_json_err(&format!(r#"[{{"4/4": {{"tempo": {}}}}}]"#, tempo));
            assert!(matches!(error, ParseError::IllFormedTempo(_)), "{}", tempo);
        }
    }

    #[test]
    fn test_tempo_encodings() {
        for (tempo, expected) in [("90", 90.0), ("90.5", 90.5), (r#"" 72 ""#, 72.0)] {
            let value: serde_json::Value =
                serde_json::from_str(&format!(r#"[{{"3/8": {{"tempo": {}}}}}]"#, tempo)).unwrap();
            let structure = parse_score(&Node::from(value)).unwrap();
            let first = structure.tempi().events()[0].tempo;
            assert_eq!(first.beats_per_minute(), expected);
            assert_eq!(first.subdivision(), 8);
        }
    }

    #[test]
    fn test_ill_formed_elements() {
        assert_eq!(
            parse_json_err("[42]"),
            ParseError::IllFormedScoreElement(Node::Integer(42))
        );
        assert!(matches!(
            parse_json_err(r#"[{"tempo": 60}]"#),
            ParseError::IllFormedScoreElement(_)
        ));
        assert!(matches!(
            parse_json_err(r#"[{"4/4": 60}]"#),
            ParseError::IllFormedScoreElement(_)
        ));
    }

    #[test]
    fn test_yaml_score() {
        let structure = parse_yaml(
            "- 4/4:\n  tempo_change: 30\n- 3/4\n- 5/4:\n    - 5:\n      tempo: 240\n",
        );

        assert_eq!(
            structure.meters(),
            &[Meter::new(4, 4), Meter::new(3, 4), Meter::new(5, 4)]
        );

        let events = structure.tempi().events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].offset, MetricalDuration::ZERO);
        assert_eq!(events[0].tempo.beats_per_minute(), 30.0);
        assert!(!events[0].interpolating);
        assert_eq!(events[1].offset, MetricalDuration::new(12, 4));
        assert_eq!(events[1].tempo.beats_per_minute(), 240.0);

        // seven quarters at 30 bpm
        assert_close(structure.seconds_at(MetricalDuration::new(7, 4)), 14.0);
    }

    #[test]
    fn test_nested_offsets() {
        let structure = parse_yaml(
            "- 4/4\n\
             - 4/4:\n    \
                 - 2:\n        tempo: 120\n    \
                 - 3/8:\n        tempo_change: 90\n",
        );

        let events = structure.tempi().events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].tempo, Tempo::default());
        assert_eq!(events[1].offset, MetricalDuration::new(11, 8));
        assert!(events[1].interpolating);
        assert_eq!(events[1].tempo, Tempo::new(90.0, 4));
        assert_eq!(events[2].offset, MetricalDuration::new(6, 4));
        assert_eq!(events[2].tempo, Tempo::new(120.0, 4));
        assert!(!events[2].interpolating);
    }

    #[test]
    fn test_nested_offsets_sorted_by_offset() {
        // 3/8 lies before beat 2 in 4/4
        let structure = parse_yaml(
            "- 4/4:\n    \
                 - 2:\n        tempo: 120\n    \
                 - 3/8:\n        tempo: 90\n",
        );
        let offsets: Vec<MetricalDuration> = structure
            .tempi()
            .events()
            .iter()
            .map(|event| event.offset)
            .collect();
        assert_eq!(
            offsets,
            vec![
                MetricalDuration::ZERO,
                MetricalDuration::new(3, 8),
                MetricalDuration::new(2, 4)
            ]
        );
    }

    #[test]
    fn test_nested_offset_must_be_recognisable() {
        assert!(matches!(
            parse_json_err(r#"[{"4/4": [{"tempo": 60}]}]"#),
            ParseError::IllFormedOffset(_)
        ));
        assert!(matches!(
            parse_json_err(r#"[{"4/4": [{"-1": {"tempo": 60}}]}]"#),
            ParseError::IllFormedOffset(_)
        ));
        assert_eq!(
            parse_json_err(r#"[{"4/4": ["2"]}]"#),
            ParseError::IllFormedOffset(Node::from("2"))
        );
    }

    #[test]
    fn test_repetition_advances_offset() {
        let structure = parse_yaml("- 2/4\n- 3/4 x 4\n- 3/4:\n  tempo: 90\n");

        assert_eq!(structure.meters().len(), 6);
        let events = structure.tempi().events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].offset, MetricalDuration::new(14, 4));
    }

    #[test]
    fn test_first_tempo_attribute_wins() {
        let structure = parse_yaml(
            "- 4/4:\n  tempo: 100\n  tempo_change: 50\n- 4/4:\n  tempo_change: 50\n  tempo: 100\n",
        );
        let events = structure.tempi().events();
        assert_eq!(events[0].tempo.beats_per_minute(), 100.0);
        assert!(!events[0].interpolating);
        assert_eq!(events[1].tempo.beats_per_minute(), 50.0);
        assert!(events[1].interpolating);
    }

    #[test]
    fn test_unknown_attributes_are_ignored() {
        let structure = parse_yaml("- 4/4:\n  tempo: 100\n  swing: 0.6\n");
        assert_eq!(structure.meters(), &[Meter::new(4, 4)]);
        assert_eq!(structure.tempi().len(), 1);
    }

    #[test]
    fn test_default_tempo_option() {
        let options = ParserOptions {
            default_tempo: Tempo::new(120.0, 8),
        };
        let mut parser = ScoreParser::new(score(vec![Node::from("6/8")]))
            .unwrap()
            .with_options(options);
        let structure = parser.parse().unwrap();
        assert_eq!(structure.tempi().tempo_at(MetricalDuration::ZERO), Tempo::new(120.0, 8));
        assert_close(structure.seconds_at(structure.total_duration()), 3.0);
    }

    #[test]
    fn test_parser_is_reusable() {
        let document = score(vec![
            Node::from("4/4 x 2"),
            Node::mapping([("3/4", Node::mapping([("tempo", 90.0)]))]),
        ]);
        let mut parser = ScoreParser::new(document).unwrap();

        let first = parser.parse().unwrap();
        let second = parser.parse().unwrap();
        assert_eq!(first, second);
        assert_eq!(parser.meters().len(), 3);
        assert_eq!(second.tempi().events()[1].offset, MetricalDuration::new(2, 1));
    }

    #[test]
    fn test_empty_score() {
        let structure = parse_score(&score(vec![])).unwrap();
        assert!(structure.meters().is_empty());
        assert_eq!(structure.tempi().len(), 1);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ParseError::IllFormedMeter("12/13".to_string()).to_string(),
            "Ill-formed meter '12/13'"
        );
        assert_eq!(
            ParseError::IllFormedTempo(Node::Bool(true)).to_string(),
            "Ill-formed tempo true"
        );
        assert_eq!(
            ParseError::IllFormedMeter("3,4".to_string()).fragment(),
            Node::from("3,4")
        );
    }

    #[test]
    fn test_offset_overflow_is_an_error() {
        let repeated = "4611686018427387904/1 x 2";
        assert_eq!(
            parse_score(&score(vec![Node::from(repeated)])),
            Err(ParseError::IllFormedMeter(repeated.to_string()))
        );

        let huge = "4611686018427387904/1";
        assert_eq!(
            parse_score(&score(vec![Node::from(huge), Node::from(huge)])),
            Err(ParseError::IllFormedMeter(huge.to_string()))
        );

        // two whole notes do not fit in 2^62ths
        let fine = "1/4611686018427387904";
        assert_eq!(
            parse_score(&score(vec![Node::from("2/1"), Node::from(fine)])),
            Err(ParseError::IllFormedMeter(fine.to_string()))
        );

        assert!(matches!(
            parse_json_err(r#"["4/4", {"4/4": [{"9223372036854775807": {"tempo": 60}}]}]"#),
            ParseError::IllFormedOffset(_)
        ));
    }

    #[test]
    fn test_repetition_limit() {
        let structure = parse_score(&score(vec![Node::from("1/4 x 65536")])).unwrap();
        assert_eq!(structure.meters().len(), MAX_REPETITIONS);

        let text = "1/4 x 65537";
        assert_eq!(
            parse_score(&score(vec![Node::from(text)])),
            Err(ParseError::IllFormedMeter(text.to_string()))
        );
    }

    #[test]
    fn test_fine_subdivisions_within_range() {
        let structure = parse_yaml(
            "- 1/4611686018427387904:\n  tempo: 60\n- 4/4:\n  tempo_change: 120\n",
        );
        let seconds = structure.seconds_at(structure.total_duration());
        assert_close(seconds, 2.0);
    }

    #[test]
    fn test_tempo_must_survive_respelling() {
        assert_eq!(
            parse_json_err(r#"[{"4/4": {"tempo": 1e308}}, {"4/128": {"tempo_change": 60}}]"#),
            ParseError::IllFormedTempo(Node::Float(1e308))
        );
        assert!(matches!(
            parse_json_err(r#"[{"4/4": {"tempo": 1e-308}}]"#),
            ParseError::IllFormedTempo(_)
        ));

        let options = ParserOptions {
            default_tempo: Tempo::new(1e308, 4),
        };
        let mut parser = ScoreParser::new(score(vec![Node::from("4/4")]))
            .unwrap()
            .with_options(options);
        assert_eq!(parser.parse(), Err(ParseError::IllFormedTempo(Node::Float(1e308))));
    }

    #[test]
    fn test_deeper_lists_count_from_enclosing_offset() {
        let structure = parse_yaml(
            "- 4/4:\n    \
                 - 2:\n        \
                     - 1:\n            tempo: 90\n",
        );
        let events = structure.tempi().events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].offset, MetricalDuration::new(3, 4));
        assert_eq!(events[1].tempo, Tempo::new(90.0, 4));
    }

    #[test]
    fn test_nested_tempo_replaces_downbeat_tempo() {
        let structure = parse_yaml("- 4/4:\n    - 0:\n        tempo: 80\n  tempo: 100\n");
        let events = structure.tempi().events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].offset, MetricalDuration::ZERO);
        assert_eq!(events[0].tempo, Tempo::new(80.0, 4));
    }

    proptest! {
        #[test]
        fn prop_valid_meters_parse(beats in 1i64..1000, exponent in 0u32..10) {
            let subdivision = 1i64 << exponent;
            let text = format!("{}/{}", beats, subdivision);
            prop_assert_eq!(parse_meter(&text), Ok(Meter::new(beats, subdivision)));
        }

        #[test]
        fn prop_repetition_expands(count in 1usize..50) {
            let document = score(vec![Node::from(format!("5/8 x {}", count))]);
            let structure = parse_score(&document).unwrap();
            prop_assert_eq!(structure.meters().len(), count);
            prop_assert_eq!(
                structure.total_duration(),
                MetricalDuration::new(5 * count as i64, 8)
            );
        }
    }
}
