/// A context free grammar in the Lark description language
///
/// Grammars are checked by the Trex API, never locally. A malformed grammar
/// comes back as [`ClientError::InvalidGrammar`](crate::ClientError::InvalidGrammar).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grammar {
    pub name: &'static str,
    /// Bumped whenever `source` changes
    pub version: u32,
    /// Output language hint sent alongside the grammar
    pub language: Option<&'static str>,
    pub source: &'static str,
}

/// Any valid JSON value
pub const JSON_GRAMMAR: Grammar = Grammar {
    name: "json",
    version: 1,
    language: Some("json"),
    source: include_str!("grammars/json.lark"),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_grammar_covers_every_value_kind() {
        for rule in ["object", "array", "string", "SIGNED_NUMBER", "\"null\""] {
            assert!(
                JSON_GRAMMAR.source.contains(rule),
                "JSON grammar is missing {rule}"
            );
        }
        assert!(JSON_GRAMMAR.source.starts_with("?start: value"));
    }

    #[test]
    fn json_grammar_sends_json_language() {
        assert_eq!(JSON_GRAMMAR.language, Some("json"));
    }
}
