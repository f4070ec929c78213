use pest::{iterators::Pair, Parser};
use pest_derive::Parser;
use smol_str::SmolStr;

#[derive(Parser)]
#[grammar = "sdoc.pest"]
pub struct DocParser;

// box the error since rust warns about the error type being too big
pub type DocParseError = Box<pest::error::Error<Rule>>;

/// A parsed `/** ... */` block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocumentationBlock {
    pub text: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Param(ParamTag),
    Return(TypeTag),
    Type(TypeTag),
    Other { name: SmolStr, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamTag {
    pub name: SmolStr,
    /// Canonical type names, empty when the tag has no `{...}`.
    pub types: Vec<SmolStr>,
    pub usage: ParamUsage,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamUsage {
    Required,
    /// `[name]` or `[name=default]`
    Optional,
    /// `...name`
    OneOrMore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTag {
    pub types: Vec<SmolStr>,
    pub text: String,
}

impl DocumentationBlock {
    pub fn params(&self) -> impl Iterator<Item = &ParamTag> + '_ {
        self.tags.iter().filter_map(|tag| match tag {
            Tag::Param(param) => Some(param),
            _ => None,
        })
    }

    /// The `index`th `@param` tag, in the order the tags were written.
    pub fn param_at(&self, index: usize) -> Option<&ParamTag> {
        self.params().nth(index)
    }

    pub fn return_types(&self) -> Vec<SmolStr> {
        self.tags
            .iter()
            .filter_map(|tag| match tag {
                Tag::Return(ret) => Some(ret.types.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn has_return(&self) -> bool {
        self.tags.iter().any(|tag| matches!(tag, Tag::Return(_)))
    }

    /// Types from `@type` tags.
    pub fn declared_types(&self) -> Vec<SmolStr> {
        self.tags
            .iter()
            .filter_map(|tag| match tag {
                Tag::Type(ty) => Some(ty.types.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| match tag {
            Tag::Param(_) => name == "param",
            Tag::Return(_) => name == "return" || name == "returns",
            Tag::Type(_) => name == "type",
            Tag::Other { name: other, .. } => other == name,
        })
    }
}

/// Parse a doc comment, with or without its `/**` `*/` delimiters.
pub fn parse_doc_comment(comment: &str) -> Result<DocumentationBlock, DocParseError> {
    let cleaned = strip_comment(comment);
    let mut pairs = DocParser::parse(Rule::doc, &cleaned)?;
    let mut block = DocumentationBlock::default();

    let Some(doc) = pairs.next() else {
        return Ok(block);
    };
    for pair in doc.into_inner() {
        match pair.as_rule() {
            Rule::description => block.text = pair.as_str().trim().to_string(),
            Rule::param_tag => block.tags.push(Tag::Param(collect_param(pair))),
            Rule::return_tag => block.tags.push(Tag::Return(collect_type_tag(pair))),
            Rule::type_tag => block.tags.push(Tag::Type(collect_type_tag(pair))),
            Rule::other_tag => {
                let mut name = SmolStr::default();
                let mut text = String::new();
                for inner in pair.into_inner() {
                    match inner.as_rule() {
                        Rule::tag_name => name = inner.as_str().into(),
                        Rule::text => text = inner.as_str().trim().to_string(),
                        _ => {}
                    }
                }
                block.tags.push(Tag::Other { name, text });
            }
            _ => {}
        }
    }

    Ok(block)
}

fn strip_comment(comment: &str) -> String {
    let body = comment.trim();
    let body = body.strip_prefix("/**").unwrap_or(body);
    let body = body.strip_suffix("*/").unwrap_or(body);

    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').unwrap_or(line).trim()
        })
        .collect();
    lines.join("\n").trim().to_string()
}

fn collect_types(pair: Pair<Rule>) -> Vec<SmolStr> {
    match pair.as_rule() {
        Rule::types => pair
            .into_inner()
            .map(|text| js_ty::split_union(text.as_str()))
            .next()
            .unwrap_or_default(),
        Rule::bare_type => js_ty::split_union(pair.as_str()),
        _ => Vec::new(),
    }
}

fn collect_type_tag(pair: Pair<Rule>) -> TypeTag {
    let mut tag = TypeTag {
        types: Vec::new(),
        text: String::new(),
    };
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::types | Rule::bare_type => tag.types = collect_types(inner),
            Rule::text => tag.text = inner.as_str().trim().to_string(),
            _ => {}
        }
    }
    tag
}

fn collect_param(pair: Pair<Rule>) -> ParamTag {
    let mut tag = ParamTag {
        name: SmolStr::default(),
        types: Vec::new(),
        usage: ParamUsage::Required,
        text: String::new(),
    };
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::types => tag.types = collect_types(inner),
            Rule::text => tag.text = inner.as_str().trim().to_string(),
            Rule::optional_name | Rule::rest_name | Rule::plain_name => {
                tag.usage = match inner.as_rule() {
                    Rule::optional_name => ParamUsage::Optional,
                    Rule::rest_name => ParamUsage::OneOrMore,
                    _ => ParamUsage::Required,
                };
                if let Some(name) = inner.into_inner().find(|p| p.as_rule() == Rule::name) {
                    tag.name = name.as_str().into();
                }
            }
            _ => {}
        }
    }
    tag
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn function_docs() {
        let doc = parse_doc_comment(indoc! {"
            /**
             * Adds two numbers.
             * Second line of text.
             *
             * @param {Number} a the first
             * @param {number|String} b
             *   the second, on two lines
             * @return {Number} the sum
             */
        "})
        .expect("no parse error");

        assert_eq!(doc.text, "Adds two numbers.\nSecond line of text.");
        let params: Vec<_> = doc.params().collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "a");
        assert_eq!(params[0].types, ["Number"]);
        assert_eq!(params[0].text, "the first");
        assert_eq!(params[1].name, "b");
        assert_eq!(params[1].types, ["Number", "String"]);
        assert_eq!(params[1].text, "the second, on two lines");
        assert_eq!(doc.return_types(), ["Number"]);
        assert!(doc.has_return());
    }

    #[test]
    fn param_usages() {
        let doc = parse_doc_comment(
            "/** @param {String} [name=\"x\"] optional\n @param {...Number} ...rest\n @param untyped */",
        )
        .expect("no parse error");

        let params: Vec<_> = doc.params().collect();
        assert_eq!(params[0].name, "name");
        assert_eq!(params[0].usage, ParamUsage::Optional);
        assert_eq!(params[1].name, "rest");
        assert_eq!(params[1].usage, ParamUsage::OneOrMore);
        assert_eq!(params[1].types, ["Number"]);
        assert_eq!(params[2].name, "untyped");
        assert!(params[2].types.is_empty());
        assert_eq!(doc.param_at(2).map(|p| p.name.as_str()), Some("untyped"));
    }

    #[test]
    fn type_and_other_tags() {
        let doc = parse_doc_comment(indoc! {"
            /**
             * @type {String[]}
             * @deprecated use something else
             * @returns {Function(String):Boolean}
             */
        "})
        .expect("no parse error");

        assert_eq!(doc.text, "");
        assert_eq!(doc.declared_types(), ["Array<String>"]);
        assert_eq!(doc.return_types(), ["Function(String):Boolean"]);
        assert!(doc.has_tag("deprecated"));
        assert!(!doc.has_tag("constructor"));
    }

    #[test]
    fn bare_type_tag() {
        let doc = parse_doc_comment("/** @type Number */").expect("no parse error");
        assert_eq!(doc.declared_types(), ["Number"]);
    }

    #[test]
    fn at_signs_in_text() {
        let doc = parse_doc_comment("/** mail me at foo@example.com\n @ not a tag */")
            .expect("no parse error");
        assert_eq!(doc.text, "mail me at foo@example.com\n@ not a tag");
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn malformed_param_is_kept_as_other() {
        let doc = parse_doc_comment("/** @param {String} */").expect("no parse error");
        assert_eq!(doc.params().count(), 0);
        assert!(doc.has_tag("param"));
    }
}
