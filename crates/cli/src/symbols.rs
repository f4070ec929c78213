// ==============================================================================
// `jsinfer symbols` output
// ==============================================================================
//
// The scope tree with every symbol's types, one `{ ... }` block per scope:
//
// ```text
// {
//   count: Function(String):Number
//   {
//     name: String
//   }
// }
// ```

use std::fmt::Write;

use js_ast::ScopeId;
use js_infer::InferCtx;

pub fn render_scopes(ctx: &mut InferCtx<'_>) -> String {
    let mut out = String::new();
    let root = ctx.scopes().root();
    render_scope(ctx, root, 0, &mut out);
    out
}

fn render_scope(ctx: &mut InferCtx<'_>, scope: ScopeId, depth: usize, out: &mut String) {
    let scopes = ctx.scopes();
    let indent = "  ".repeat(depth);

    let _ = writeln!(out, "{indent}{{");
    for name in scopes.local_symbol_names(scope) {
        let types = ctx.symbol_types(scope, name);
        let _ = writeln!(out, "{indent}  {name}: {}", types.join(", "));
    }
    for &child in scopes[scope].children() {
        render_scope(ctx, child, depth + 1, out);
    }
    let _ = writeln!(out, "{indent}}}");
}

/// Generated object types with their parents and members.
pub fn render_generated(ctx: &InferCtx<'_>) -> String {
    let mut out = String::new();
    for generated in ctx.generated_types() {
        let _ = writeln!(
            out,
            "{} extends {}",
            generated.name,
            generated.parents.join(", ")
        );
        for (name, member) in &generated.members {
            let _ = writeln!(out, "  {name}: {}", member.signature_types().join(", "));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use indoc::indoc;
    use js_ast::{lower, ModuleScopes};
    use js_infer::MemoryIndex;

    use super::*;

    fn render(src: &str) -> (String, String) {
        let module = lower(src).expect("parses");
        let scopes = ModuleScopes::new(&module);
        let index = MemoryIndex::new();
        let mut ctx = InferCtx::new(&module, &scopes, &index, Path::new("/app/main.js"));
        let tree = render_scopes(&mut ctx);
        (tree, render_generated(&ctx))
    }

    #[test]
    fn scope_tree() {
        let (tree, generated) = render(indoc! {"
            var a = 1;
            /** @param {String} name */
            function greet(name) {
              var msg = 'hi ' + name;
              return msg;
            }
        "});
        assert_eq!(
            tree,
            indoc! {"
                {
                  a: Number
                  greet: Function(String):String
                  {
                    msg: String
                    name: String
                  }
                }
            "}
        );
        assert_eq!(generated, "");
    }

    #[test]
    fn generated_types_are_listed() {
        let (tree, generated) = render(indoc! {"
            var ns = {};
            ns.count = 1;
        "});
        assert_eq!(tree, "{\n  ns: main$0.ns\n}\n");
        assert_eq!(generated, "main$0.ns extends Object\n  count: Number\n");
    }
}
