use std::collections::HashMap;

use comment_parser::{parse_doc_comment, DocumentationBlock};
use pest::Parser;

use crate::lower::{JsParser, Rule};

/// Map each `/** ... */` comment to the offset of the first non-whitespace
/// character after it, which is where the documented construct starts.
pub fn gather_doc_comments(src: &str) -> HashMap<usize, String> {
    let mut out = HashMap::new();

    let pairs = match JsParser::parse(Rule::doc_scan, src) {
        Ok(pairs) => pairs,
        Err(err) => {
            log::debug!("doc comment scan failed: {err}");
            return out;
        }
    };

    for pair in pairs.flatten().filter(|p| p.as_rule() == Rule::doc_comment) {
        let end = pair.as_span().end();
        let target = src[end..]
            .char_indices()
            .find(|(_, c)| !c.is_whitespace())
            .map_or(src.len(), |(idx, _)| end + idx);
        out.insert(target, pair.as_str().to_owned());
    }

    out
}

/// Doc comments waiting to be claimed during lowering. Each one is handed out
/// at most once.
#[derive(Default, Debug)]
pub(crate) struct DocCommentCtx {
    pending: HashMap<usize, String>,
}

impl From<HashMap<usize, String>> for DocCommentCtx {
    fn from(pending: HashMap<usize, String>) -> Self {
        Self { pending }
    }
}

impl DocCommentCtx {
    pub(crate) fn take(&mut self, offset: usize) -> Option<DocumentationBlock> {
        let raw = self.pending.remove(&offset)?;
        match parse_doc_comment(&raw) {
            Ok(block) => Some(block),
            Err(err) => {
                log::warn!("ignoring malformed doc comment at {offset}: {err}");
                None
            }
        }
    }
}
