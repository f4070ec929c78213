mod list;
mod mapper;
mod name;
mod primitive;

#[cfg(any(test, feature = "proptest_support"))]
pub mod arbitrary;

pub use list::TypeList;
pub use mapper::TypeMapper;
pub use name::{
    array_element_type, array_type, base_type_name, canonical_type_name, class_base_type,
    class_type, function_return_types, function_signature_type, function_type, is_array_type,
    is_class_type, is_function_type, is_generic_array, split_union, union_type,
};
pub use primitive::PrimitiveTy;

// ==========================================================================
// Well known names
// ==========================================================================

pub const ARRAY_TYPE: &str = "Array";
pub const BOOLEAN_TYPE: &str = "Boolean";
pub const CLASS_TYPE: &str = "Class";
pub const FUNCTION_TYPE: &str = "Function";
pub const NUMBER_TYPE: &str = "Number";
pub const OBJECT_TYPE: &str = "Object";
pub const REG_EXP_TYPE: &str = "RegExp";
pub const STRING_TYPE: &str = "String";

/// Used for parameters with no documented type.
pub const DEFAULT_PARAMETER_TYPE: &str = OBJECT_TYPE;

/// Result of compound assignments other than `=` and `+=`.
/// Every remaining compound operator (`-=`, `*=`, `<<=`, `&=`, ...) yields a number in JS.
pub const DEFAULT_ASSIGNMENT_TYPE: &str = NUMBER_TYPE;

pub const PROTOTYPE_PROPERTY: &str = "prototype";

/// jQuery's global function is indexed as a function returning `jQuery`, but
/// member access through `$` or `jQuery` means the static side of the class.
pub const FUNCTION_JQUERY: &str = "Function<jQuery>";
pub const CLASS_JQUERY: &str = "Class<jQuery>";
pub const DOLLAR: &str = "$";
pub const JQUERY: &str = "jQuery";

/// Suffix of the synthetic type describing a module's `module.exports`.
pub const EXPORTS_SUFFIX: &str = ".exports";
