use std::path::{Path, PathBuf};

use indoc::indoc;
use js_ast::{lower, Module, ModuleScopes, Node, NodeId, RootDatabase};
use js_ty::TypeMapper;
use smol_str::SmolStr;

use crate::{
    file_uri, infer_file_offset, FunctionElement, InferCtx, MemoryIndex, ModuleResolver,
    ParameterElement, PropertyElement,
};

const MAIN: &str = "/project/main.js";

/// Resolves nothing.
pub struct NoModules;

impl ModuleResolver for NoModules {
    fn resolve(&self, _id: &str, _current_dir: &Path, _root: Option<&Path>) -> Option<PathBuf> {
        None
    }
}

/// Resolves a fixed set of ids.
pub struct FixedModules(pub Vec<(&'static str, PathBuf)>);

impl ModuleResolver for FixedModules {
    fn resolve(&self, id: &str, _current_dir: &Path, _root: Option<&Path>) -> Option<PathBuf> {
        self.0
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(_, path)| path.clone())
    }
}

fn function(name: &str, owner: &str, params: &[(&str, &str)], returns: &[&str]) -> FunctionElement {
    FunctionElement {
        property: PropertyElement::new(name, owner),
        parameters: params
            .iter()
            .map(|(name, ty)| ParameterElement {
                name: (*name).into(),
                types: vec![(*ty).into()],
            })
            .collect(),
        return_types: returns.iter().map(|ty| SmolStr::from(*ty)).collect(),
    }
}

pub fn fixture_index() -> MemoryIndex {
    let mut index = MemoryIndex::new().with_root("/project");

    index.add_type("Object", Vec::<&str>::new());
    index.add_member(function("toString", "Object", &[], &["String"]));

    index.add_type("String", ["Object"]);
    index.add_member(PropertyElement::new("length", "String").with_types(["Number"]));
    index.add_member(function("charAt", "String", &[("index", "Number")], &["String"]));

    index.add_type("Array", ["Object"]);
    index.add_member(PropertyElement::new("length", "Array").with_types(["Number"]));

    index.add_type("jQuery", ["Object"]);
    index.add_member(function("each", "jQuery", &[], &["jQuery"]));
    index.add_type("Class<jQuery>", ["Object"]);
    index.add_member(function("ajax", "Class<jQuery>", &[], &["XMLHttpRequest"]));
    index.add_global(PropertyElement::new("$", "").with_types(["Function<jQuery>"]));
    index.add_global(PropertyElement::new("jQuery", "").with_types(["Function<jQuery>"]));

    index.add_type("Widget", ["Object"]);
    index.add_member(PropertyElement::new("prototype", "Widget").with_types(["Widget"]));
    index.add_member(function("render", "Widget", &[], &["Boolean"]));
    index.add_global(PropertyElement::new("Widget", "").with_types(["Class<Widget>"]));

    index.add_type("HTMLElement", ["Object"]);
    index.add_member(PropertyElement::new("id", "HTMLElement").with_types(["String"]));
    index.add_global(PropertyElement::new("el", "").with_types(["Element"]));

    index
}

/// The expression of the last expression statement.
fn last_expr(module: &Module) -> NodeId {
    let Node::Program(statements) = &module[module.entry] else {
        panic!("entry is not a program");
    };
    statements
        .iter()
        .rev()
        .find_map(|&stmt| match &module[stmt] {
            Node::ExprStatement(expr) => Some(*expr),
            _ => None,
        })
        .expect("fixture ends with an expression statement")
}

pub struct Inference<'a> {
    pub index: &'a MemoryIndex,
    pub type_map: TypeMapper,
    pub resolver: &'a dyn ModuleResolver,
    pub location: &'a Path,
}

impl<'a> Inference<'a> {
    pub fn new(index: &'a MemoryIndex) -> Self {
        Self {
            index,
            type_map: TypeMapper::default(),
            resolver: &NoModules,
            location: Path::new(MAIN),
        }
    }

    /// Types of the last expression statement of `src`.
    pub fn last(&self, src: &str) -> Vec<SmolStr> {
        self.with_ctx(src, |ctx| {
            let module = ctx.module();
            let expr = last_expr(module);
            let scope = ctx.scopes().scope_at_offset(module.span(expr).start);
            ctx.infer(expr, scope)
        })
    }

    pub fn with_ctx<T>(&self, src: &str, f: impl FnOnce(&mut InferCtx<'_>) -> T) -> T {
        let module = lower(src).expect("fixture parses");
        let scopes = ModuleScopes::new(&module);
        let mut ctx = InferCtx::new(&module, &scopes, self.index, self.location)
            .with_resolver(self.resolver)
            .with_type_map(self.type_map.clone());
        f(&mut ctx)
    }
}

pub fn infer_last(src: &str) -> Vec<SmolStr> {
    let index = fixture_index();
    Inference::new(&index).last(src)
}

macro_rules! test_case {
    ($name:ident, $file:tt, [$($ty:expr),* $(,)?]) => {
        #[test]
        fn $name() {
            let file = indoc! { $file };
            let expected: Vec<&str> = vec![$($ty),*];
            assert_eq!(infer_last(file), expected);
        }
    };
}

// ==========================================================================
// Literals and operators
// ==========================================================================

test_case!(string_literal, "'hello';", ["String"]);
test_case!(number_literal, "0x1F;", ["Number"]);
test_case!(boolean_literal, "false;", ["Boolean"]);
test_case!(regex_literal, "x = /ab+c/gi;", ["RegExp"]);
test_case!(null_and_this, "null;", []);
test_case!(this_contributes_nothing, "this;", []);
test_case!(comma_contributes_nothing, "1, 'a';", []);

test_case!(string_plus_number, "\"a\" + 1;", ["String"]);
test_case!(number_plus_number, "1 + 2;", ["Number"]);
test_case!(string_at_end_of_chain, "1 + 2 + 'x';", ["String"]);
test_case!(string_at_start_of_chain, "'x' + 1 + 2;", ["String"]);
test_case!(
    string_symbol_in_chain,
    "
    var s = 'x';
    1 + 2 + s;
    ",
    ["String"]
);
test_case!(
    string_inside_group,
    "
    (1 + 'a') + 2;
    ",
    ["String"]
);
test_case!(other_arithmetic, "'a' * 2;", ["Number"]);
test_case!(comparison, "1 < 'b';", ["Boolean"]);
test_case!(instance_of, "a instanceof b;", ["Boolean"]);

test_case!(or_with_unknown, "(x || 'default');", ["String"]);
test_case!(and_is_union, "1 && 'a' && 2;", ["Number", "String"]);
test_case!(conditional_is_union, "c ? 1 : 'a';", ["Number", "String"]);
test_case!(conditional_dedups, "c ? 1 : 2;", ["Number"]);

test_case!(typeof_is_string, "typeof x;", ["String"]);
test_case!(not_is_boolean, "!x;", ["Boolean"]);
test_case!(delete_is_boolean, "delete a.b;", ["Boolean"]);
test_case!(void_contributes_nothing, "void 0;", []);
test_case!(negate_is_number, "-'3';", ["Number"]);
test_case!(postfix_is_number, "i++;", ["Number"]);

test_case!(assign_takes_rhs, "x = 'a';", ["String"]);
test_case!(add_assign_number, "x += 1;", ["Number"]);
test_case!(
    add_assign_string,
    "
    var s = 'a';
    s += 1;
    ",
    ["String"]
);
test_case!(other_compound_assign, "x <<= 'a';", ["Number"]);

// ==========================================================================
// Arrays, elements and members
// ==========================================================================

test_case!(empty_array, "x = [];", ["Array"]);
test_case!(number_array, "x = [1, 2];", ["Array<Number>"]);
test_case!(first_element_decides, "x = [1, 'a'];", ["Array<Number>"]);
test_case!(
    array_element,
    "
    var xs = ['a', 'b'];
    xs[0];
    ",
    ["String"]
);
test_case!(element_of_non_array, "x[0];", []);
test_case!(
    element_of_object,
    "
    var n = 1;
    n[0];
    ",
    ["Object"]
);

test_case!(string_member, "'abc'.length;", ["Number"]);
test_case!(generic_array_member, "[1].length;", ["Number"]);
test_case!(inherited_member, "'abc'.toString;", ["Function():String"]);
test_case!(method_call, "'abc'.charAt(0);", ["String"]);
test_case!(unknown_member, "'abc'.nope;", []);

// ==========================================================================
// Functions
// ==========================================================================

test_case!(function_without_return, "f = function() {};", ["Function"]);
test_case!(function_with_return, "f = function() { return 5; };", ["Function<Number>"]);
test_case!(
    function_returning_unknown,
    "f = function() { return missing; };",
    ["Function<Object>"]
);
test_case!(
    function_bare_return,
    "f = function() { return; };",
    ["Function"]
);
test_case!(
    function_multiple_returns,
    "
    f = function(a) {
      if (a) { return 1; }
      return 'b';
    };
    ",
    ["Function<Number|String>"]
);
test_case!(
    nested_function_returns_are_ignored,
    "
    f = function() {
      var g = function() { return 'inner'; };
      return 1;
    };
    ",
    ["Function<Number>"]
);
test_case!(
    function_body_scope,
    "
    var n = 'outer';
    f = function() {
      var n = 5;
      return n;
    };
    ",
    ["Function<Number>"]
);
test_case!(
    outer_symbol_from_function,
    "
    var n = 'outer';
    f = function() { return n; };
    ",
    ["Function<String>"]
);

test_case!(
    documented_function,
    "
    /**
     * @param {String} name
     * @return {Number}
     */
    function count(name) { return name; }
    count;
    ",
    ["Function(String):Number"]
);
test_case!(
    call_documented_function,
    "
    /**
     * @param {String} name
     * @return {Number}
     */
    function count(name) { return name; }
    count('x');
    ",
    ["Number"]
);
test_case!(
    parameter_types_from_docs,
    "
    /** @param {String} name */
    function greet(name) { return name; }
    greet('x');
    ",
    ["String"]
);
test_case!(
    undocumented_parameter,
    "
    function id(x) { return x; }
    id;
    ",
    ["Function(Object):Object"]
);
test_case!(
    param_tag_must_match_name,
    "
    /** @param {String} other */
    function id(x) { return x; }
    id(1);
    ",
    ["Object"]
);
test_case!(
    declared_type,
    "
    /** @type {String[]} */
    var names = unknownThing;
    names[0];
    ",
    ["String"]
);

// ==========================================================================
// Calls
// ==========================================================================

test_case!(call_unknown_statement, "missing();", []);
test_case!(call_unknown_assigned, "x = missing();", ["Object"]);
test_case!(call_unknown_then_member, "missing().length;", []);
test_case!(call_non_function, "var n = 1; n();", []);

test_case!(jquery_static_member, "$.ajax;", ["Function():XMLHttpRequest"]);
test_case!(jquery_long_name, "jQuery.ajax();", ["XMLHttpRequest"]);
test_case!(jquery_instance, "$('div').each();", ["jQuery"]);
test_case!(
    jquery_alias_needs_identifier,
    "
    var make = function() { return $; };
    make().ajax;
    ",
    []
);

test_case!(
    returned_function_keeps_its_union,
    "
    g = function(c) { return c ? 1 : 'a'; };
    f = function() { return g; };
    f()();
    ",
    ["Number", "String"]
);
test_case!(
    returned_function_signature,
    "
    g = function(c) { return c ? 1 : 'a'; };
    f = function() { return g; };
    f;
    ",
    ["Function():(Function(Object):Number|String)"]
);

// ==========================================================================
// Construction
// ==========================================================================

test_case!(construct_index_class, "new Widget();", ["Widget"]);
test_case!(construct_index_class_with_args, "(new Widget(1, 'a')).render();", ["Boolean"]);
test_case!(construct_unknown, "new Nothing();", []);

#[test]
fn construct_from_prototype() {
    let src = indoc! {"
        function Point() {}
        Point.prototype = { x: 1 };
        new Point();
    "};
    let literal = src.find("{ x").unwrap();
    assert_eq!(infer_last(src), [format!("main${literal}")]);

    let src = indoc! {"
        function Point() {}
        Point.prototype = { x: 1 };
        (new Point()).x;
    "};
    assert_eq!(infer_last(src), ["Number"]);
}

// ==========================================================================
// require
// ==========================================================================

fn module_index() -> MemoryIndex {
    let mut index = fixture_index();
    index.add_module("Foo", file_uri(Path::new("/project/foo.js")));
    index
}

#[test]
fn require_resolved_module() {
    let index = module_index();
    let resolver = FixedModules(vec![("./foo", PathBuf::from("/project/foo.js"))]);
    let mut inference = Inference::new(&index);
    inference.resolver = &resolver;

    assert_eq!(inference.last("require('./foo');"), ["Foo.exports"]);
    // the unknown `require` callee still falls back to Object in an assignment
    assert_eq!(inference.last("x = require('./foo');"), ["Foo.exports", "Object"]);
    assert!(inference.last("require('./bar');").is_empty());
    assert!(inference.last("require(name);").is_empty());
}

#[test]
fn require_without_module_record() {
    let index = fixture_index();
    let resolver = FixedModules(vec![("./foo", PathBuf::from("/project/foo.js"))]);
    let mut inference = Inference::new(&index);
    inference.resolver = &resolver;

    assert!(inference.last("require('./foo');").is_empty());
}

#[test]
fn require_through_node_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("main.js");
    let foo = dir.path().join("lib").join("foo.js");
    std::fs::create_dir_all(foo.parent().unwrap()).unwrap();
    std::fs::write(&foo, "module.exports = {};").unwrap();

    let mut index = fixture_index();
    index.set_root(dir.path());
    index.add_module("Foo", file_uri(&foo));

    let mut inference = Inference::new(&index);
    inference.resolver = &crate::NODE_RESOLVER;
    inference.location = main.as_path();

    assert_eq!(inference.last("require('./lib/foo');"), ["Foo.exports"]);
    assert!(inference.last("require('./lib/bar');").is_empty());
}

// ==========================================================================
// Symbols and generated types
// ==========================================================================

#[test]
fn object_literal_type() {
    let src = indoc! {"
        var point = {x: 1, y: 'a'};
        point;
    "};
    let literal = src.find('{').unwrap();
    let name = format!("main${literal}");
    assert_eq!(infer_last(src), [name.as_str()]);

    let index = fixture_index();
    Inference::new(&index).with_ctx(src, |ctx| {
        let root = ctx.scopes().root();
        ctx.symbol_types(root, "point");
        let generated = ctx.generated_type(&name).expect("literal type is generated");
        assert_eq!(generated.parents, ["Object"]);
        let members: Vec<&str> = generated.members.keys().map(SmolStr::as_str).collect();
        assert_eq!(members, ["x", "y"]);
        assert_eq!(generated.members["y"].type_names(), ["String"]);
    });
}

test_case!(
    literal_member,
    "
    var point = {x: 1, y: 'a'};
    point.y;
    ",
    ["String"]
);
test_case!(
    nested_literal_member,
    "
    var config = {db: {port: 80}};
    config.db.port;
    ",
    ["Number"]
);
test_case!(empty_literal, "x = {};", ["Object"]);

test_case!(
    assigned_properties,
    "
    var ns = {};
    ns.count = 1;
    ns.name = 'n';
    ns.name;
    ",
    ["String"]
);
test_case!(
    assigned_property_symbol,
    "
    var ns = {};
    ns.count = 1;
    ns;
    ",
    ["main$0.ns"]
);
test_case!(
    undeclared_namespace,
    "
    app.version = '1.0';
    app.version;
    ",
    ["String"]
);
test_case!(
    existing_member_is_not_regenerated,
    "
    var s = 'abc';
    s.length = 3;
    s;
    ",
    ["String"]
);
test_case!(
    deep_property_assignment,
    "
    var app = {};
    app.models.user = 'u';
    app.models.user;
    ",
    ["String"]
);

test_case!(
    function_with_properties,
    "
    function make() { return 1; }
    make.extra = true;
    make.extra;
    ",
    ["Boolean"]
);
test_case!(
    function_with_properties_is_callable,
    "
    function make() { return 1; }
    make.extra = true;
    make();
    ",
    ["Number"]
);
test_case!(
    function_with_properties_signature,
    "
    function make() { return 1; }
    make.extra = true;
    make;
    ",
    ["Function():Number", "main$0.make"]
);

test_case!(
    symbol_in_function_scope,
    "
    f = function() {
      var local = {};
      local.flag = true;
      return local.flag;
    };
    ",
    ["Function<Boolean>"]
);

test_case!(
    global_from_index,
    "
    Widget;
    ",
    ["Class<Widget>"]
);
test_case!(
    local_shadows_global,
    "
    var Widget = 1;
    Widget;
    ",
    ["Number"]
);

#[test]
fn generated_names_are_stable() {
    let src = indoc! {"
        var ns = {};
        ns.count = 1;
        ns;
    "};
    let index = fixture_index();
    Inference::new(&index).with_ctx(src, |ctx| {
        let root = ctx.scopes().root();
        let first = ctx.symbol_types(root, "ns");
        let second = ctx.symbol_types(root, "ns");
        assert_eq!(first, second);
        assert_eq!(ctx.generated_types().len(), 1);

        let generated = ctx.generated_type("main$0.ns").expect("generated");
        assert_eq!(generated.parents, ["Object"]);
    });
}

#[test]
fn generated_names_from_unusual_file_names() {
    let src = indoc! {"
        var o = {a: 1};
        o.extra = 'x';
        o.a;
    "};
    let index = fixture_index();
    for (file, generated) in [
        ("/proj/my file.js", "myfile$0.o"),
        ("/proj/.eslintrc.js", "eslintrc$0.o"),
    ] {
        let mut inference = Inference::new(&index);
        inference.location = Path::new(file);
        assert_eq!(inference.last(src), ["Number"], "{file}");
        inference.with_ctx(src, |ctx| {
            let root = ctx.scopes().root();
            assert_eq!(ctx.symbol_types(root, "o"), [generated], "{file}");
            assert!(ctx.generated_type(generated).is_some(), "{file}");
        });
    }
}

#[test]
fn cycles_terminate() {
    assert!(infer_last(indoc! {"
        var a = b;
        var b = a;
        a;
    "})
    .is_empty());

    assert_eq!(
        infer_last(indoc! {"
            var list = {};
            list.next = list;
            list;
        "}),
        ["main$0.list"]
    );

    assert_eq!(
        infer_last(indoc! {"
            function loop() { return loop(); }
            loop;
        "}),
        ["Function():Object"]
    );
}

// ==========================================================================
// Whole-call properties
// ==========================================================================

#[test]
fn inference_is_idempotent() {
    let src = indoc! {"
        var ns = {a: [1], b: function() { return 'x'; }};
        ns.c = ns.b() + 1;
        x = ns.c || ns.a;
    "};
    let index = fixture_index();
    Inference::new(&index).with_ctx(src, |ctx| {
        let module = ctx.module();
        let expr = last_expr(module);
        let scope = ctx.scopes().root();
        let first = ctx.infer(expr, scope);
        let second = ctx.infer(expr, scope);
        // `ns.b()` inside `ns.c` refers back to `ns` while it is being inferred
        assert_eq!(first, ["Number", "Array<Number>"]);
        assert_eq!(first, second);
    });
}

#[test]
fn type_map_renames_receivers() {
    let index = fixture_index();
    assert!(Inference::new(&index).last("el.id;").is_empty());

    let mut inference = Inference::new(&index);
    inference.type_map.insert("Element", "HTMLElement");
    assert_eq!(inference.last("el.id;"), ["String"]);
}

#[test]
fn type_map_renames_documented_params() {
    let index = fixture_index();
    let mut inference = Inference::new(&index);
    inference.type_map.insert("Element", "HTMLElement");
    let src = indoc! {"
        /** @param {Element} node */
        function f(node) { return node; }
        f;
    "};
    assert_eq!(inference.last(src), ["Function(HTMLElement):HTMLElement"]);
}

#[test]
fn infer_at_offset() {
    let src = indoc! {"
        var total = 1 + 2;
        total + 'x';
    "};
    let index = fixture_index();
    Inference::new(&index).with_ctx(src, |ctx| {
        let decl = src.find("total").unwrap() as u32;
        assert_eq!(ctx.infer_at_offset(decl), ["Number"]);

        let use_site = src.rfind("total").unwrap() as u32;
        assert_eq!(ctx.infer_at_offset(use_site), ["Number"]);

        let literal = src.find("'x'").unwrap() as u32;
        assert_eq!(ctx.infer_at_offset(literal), ["String"]);
    });
}

#[test]
fn infer_through_database() {
    let src = "var s = 'a';\ns.length;\n";
    let mut db = RootDatabase::default();
    let file = db.set_file_contents(PathBuf::from(MAIN), src.to_string());
    let index = fixture_index();

    let offset = src.find(".length").unwrap() as u32 + 1;
    let types = infer_file_offset(&db, file, &index, &TypeMapper::default(), offset).unwrap();
    assert_eq!(types, ["Number"]);

    let broken = db.set_file_contents(PathBuf::from(MAIN), "var = 1;".to_string());
    let err = infer_file_offset(&db, broken, &index, &TypeMapper::default(), 0).unwrap_err();
    assert_eq!(err.offset(), 4);
}
