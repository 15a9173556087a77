//! Static binding information: items and `use` imports.
//!
//! Items are indexed by their simple name across every nesting level of a
//! file (modules, impl blocks, function bodies). When two items with the
//! same name disagree, the entry degrades to "unknown" rather than picking
//! one.

use std::collections::{HashMap, HashSet};

use syn::visit::{self, Visit};

use crate::syntax::ReturnShape;

// ============================================================================
// Items
// ============================================================================

/// A `const` item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstItem {
    /// Known only for `bool` constants initialized with a literal.
    pub value: Option<bool>,
}

/// Items defined in a file or package.
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    consts: HashMap<String, ConstItem>,
    statics: HashSet<String>,
    functions: HashMap<String, ReturnShape>,
    methods: HashMap<String, ReturnShape>,
}

impl ItemIndex {
    /// Index every item in a parsed file.
    pub fn from_file(file: &syn::File) -> Self {
        let mut collector = ItemCollector::default();
        collector.visit_file(file);
        collector.index
    }

    /// Fold another index into this one.
    pub fn merge(&mut self, other: &ItemIndex) {
        for (name, item) in &other.consts {
            self.add_const(name, *item);
        }
        self.statics.extend(other.statics.iter().cloned());
        for (name, shape) in &other.functions {
            add_shape(&mut self.functions, name, *shape);
        }
        for (name, shape) in &other.methods {
            add_shape(&mut self.methods, name, *shape);
        }
    }

    pub fn constant(&self, name: &str) -> Option<ConstItem> {
        self.consts.get(name).copied()
    }

    pub fn is_static(&self, name: &str) -> bool {
        self.statics.contains(name)
    }

    /// Free or associated function (no `self` receiver).
    pub fn function(&self, name: &str) -> Option<ReturnShape> {
        self.functions.get(name).copied()
    }

    /// Method with a `self` receiver.
    pub fn method(&self, name: &str) -> Option<ReturnShape> {
        self.methods.get(name).copied()
    }

    fn add_const(&mut self, name: &str, item: ConstItem) {
        self.consts
            .entry(name.to_string())
            .and_modify(|existing| {
                if *existing != item {
                    existing.value = None;
                }
            })
            .or_insert(item);
    }
}

fn add_shape(map: &mut HashMap<String, ReturnShape>, name: &str, shape: ReturnShape) {
    map.entry(name.to_string())
        .and_modify(|existing| {
            if *existing != shape {
                *existing = ReturnShape::Other;
            }
        })
        .or_insert(shape);
}

#[derive(Default)]
struct ItemCollector {
    index: ItemIndex,
}

impl ItemCollector {
    fn add_fn(&mut self, sig: &syn::Signature) {
        let shape = return_shape(&sig.output);
        let name = sig.ident.to_string();
        if sig.receiver().is_some() {
            add_shape(&mut self.index.methods, &name, shape);
        } else {
            add_shape(&mut self.index.functions, &name, shape);
        }
    }

    fn add_const(&mut self, ident: &syn::Ident, ty: &syn::Type, expr: &syn::Expr) {
        let value = if is_bool_type(ty) {
            literal_bool(expr)
        } else {
            None
        };
        self.index.add_const(&ident.to_string(), ConstItem { value });
    }
}

impl<'ast> Visit<'ast> for ItemCollector {
    fn visit_item_const(&mut self, item: &'ast syn::ItemConst) {
        self.add_const(&item.ident, &item.ty, &item.expr);
        visit::visit_item_const(self, item);
    }

    fn visit_impl_item_const(&mut self, item: &'ast syn::ImplItemConst) {
        self.add_const(&item.ident, &item.ty, &item.expr);
        visit::visit_impl_item_const(self, item);
    }

    fn visit_item_static(&mut self, item: &'ast syn::ItemStatic) {
        self.index.statics.insert(item.ident.to_string());
        visit::visit_item_static(self, item);
    }

    fn visit_item_fn(&mut self, item: &'ast syn::ItemFn) {
        self.add_fn(&item.sig);
        visit::visit_item_fn(self, item);
    }

    fn visit_impl_item_fn(&mut self, item: &'ast syn::ImplItemFn) {
        self.add_fn(&item.sig);
        visit::visit_impl_item_fn(self, item);
    }

    fn visit_trait_item_fn(&mut self, item: &'ast syn::TraitItemFn) {
        self.add_fn(&item.sig);
        visit::visit_trait_item_fn(self, item);
    }
}

fn is_bool_type(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(path) => path.qself.is_none() && path.path.is_ident("bool"),
        syn::Type::Group(group) => is_bool_type(&group.elem),
        syn::Type::Paren(paren) => is_bool_type(&paren.elem),
        _ => false,
    }
}

fn literal_bool(expr: &syn::Expr) -> Option<bool> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Bool(value),
            ..
        }) => Some(value.value),
        syn::Expr::Paren(paren) => literal_bool(&paren.expr),
        syn::Expr::Group(group) => literal_bool(&group.expr),
        _ => None,
    }
}

// ============================================================================
// Return shapes
// ============================================================================

/// Classify a function's declared return type.
pub fn return_shape(output: &syn::ReturnType) -> ReturnShape {
    let syn::ReturnType::Type(_, ty) = output else {
        return ReturnShape::Other;
    };
    match generic_arg(ty, "Option") {
        Some(inner) if is_error_type(inner) => ReturnShape::OptionalError,
        Some(_) => ReturnShape::Optional,
        None => ReturnShape::Other,
    }
}

/// The single type argument of `Name<T>` when `ty` is that type.
fn generic_arg<'a>(ty: &'a syn::Type, name: &str) -> Option<&'a syn::Type> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != name {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        syn::GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

/// Error types by convention: `*Error` paths, `dyn Error`, `impl Error`,
/// and smart pointers or references to any of those.
fn is_error_type(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(path) => {
            let Some(last) = path.path.segments.last() else {
                return false;
            };
            let name = last.ident.to_string();
            if matches!(name.as_str(), "Box" | "Arc" | "Rc") {
                return generic_arg(ty, &name).is_some_and(is_error_type);
            }
            name.ends_with("Error")
        }
        syn::Type::TraitObject(obj) => bounds_name_error(obj.bounds.iter()),
        syn::Type::ImplTrait(imp) => bounds_name_error(imp.bounds.iter()),
        syn::Type::Reference(reference) => is_error_type(&reference.elem),
        syn::Type::Paren(paren) => is_error_type(&paren.elem),
        syn::Type::Group(group) => is_error_type(&group.elem),
        _ => false,
    }
}

fn bounds_name_error<'a>(mut bounds: impl Iterator<Item = &'a syn::TypeParamBound>) -> bool {
    bounds.any(|bound| match bound {
        syn::TypeParamBound::Trait(tr) => tr
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "Error"),
        _ => false,
    })
}

// ============================================================================
// Imports
// ============================================================================

/// `use` aliases declared anywhere in one file.
///
/// Glob imports are not tracked.
#[derive(Debug, Clone, Default)]
pub struct ImportMap {
    crate_name: String,
    aliases: HashMap<String, Vec<String>>,
}

impl ImportMap {
    pub fn from_file(file: &syn::File, crate_name: &str) -> Self {
        let mut collector = UseCollector {
            map: ImportMap {
                crate_name: crate_name.to_string(),
                aliases: HashMap::new(),
            },
        };
        collector.visit_file(file);
        collector.map
    }

    /// Expand the first segment through the imports and normalize `crate`.
    pub fn resolve(&self, segments: &[String]) -> Vec<String> {
        let Some((first, rest)) = segments.split_first() else {
            return Vec::new();
        };
        let mut out = match self.aliases.get(first) {
            Some(full) => full.clone(),
            None => vec![first.clone()],
        };
        out.extend(rest.iter().cloned());
        self.normalize(out)
    }

    fn normalize(&self, mut path: Vec<String>) -> Vec<String> {
        if path.first().is_some_and(|s| s == "crate") {
            path[0] = self.crate_name.clone();
        }
        path
    }

    fn add_tree(&mut self, prefix: &mut Vec<String>, tree: &syn::UseTree) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.add_tree(prefix, &path.tree);
                prefix.pop();
            }
            syn::UseTree::Name(name) => {
                let ident = name.ident.to_string();
                if ident == "self" {
                    if let Some(last) = prefix.last().cloned() {
                        let full = self.normalize(prefix.clone());
                        self.aliases.insert(last, full);
                    }
                } else {
                    let mut full = prefix.clone();
                    full.push(ident.clone());
                    let full = self.normalize(full);
                    self.aliases.insert(ident, full);
                }
            }
            syn::UseTree::Rename(rename) => {
                let mut full = prefix.clone();
                if rename.ident != "self" {
                    full.push(rename.ident.to_string());
                }
                let full = self.normalize(full);
                self.aliases.insert(rename.rename.to_string(), full);
            }
            syn::UseTree::Glob(_) => {}
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.add_tree(prefix, item);
                }
            }
        }
    }
}

struct UseCollector {
    map: ImportMap,
}

impl<'ast> Visit<'ast> for UseCollector {
    fn visit_item_use(&mut self, item: &'ast syn::ItemUse) {
        self.map.add_tree(&mut Vec::new(), &item.tree);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> syn::File {
        syn::parse_file(src).expect("test source parses")
    }

    fn segs(path: &str) -> Vec<String> {
        path.split("::").map(str::to_string).collect()
    }

    mod index_tests {
        use super::*;

        #[test]
        fn bool_constants_keep_literal_values() {
            let index = ItemIndex::from_file(&parse(
                r#"
                const ON: bool = true;
                const OFF: bool = (false);
                const LIMIT: usize = 3;
                const DERIVED: bool = !ON;
                "#,
            ));
            assert_eq!(index.constant("ON"), Some(ConstItem { value: Some(true) }));
            assert_eq!(index.constant("OFF"), Some(ConstItem { value: Some(false) }));
            assert_eq!(index.constant("LIMIT"), Some(ConstItem { value: None }));
            assert_eq!(index.constant("DERIVED"), Some(ConstItem { value: None }));
            assert_eq!(index.constant("MISSING"), None);
        }

        #[test]
        fn nested_items_are_indexed() {
            let index = ItemIndex::from_file(&parse(
                r#"
                static COUNTER: u32 = 0;
                mod inner {
                    struct Form;
                    impl Form {
                        const STRICT: bool = false;
                        fn validate(&self) -> Option<ValidationError> { None }
                        fn new() -> Self { Form }
                    }
                }
                fn outer() {
                    fn lookup() -> Option<u32> { None }
                }
                "#,
            ));
            assert!(index.is_static("COUNTER"));
            assert_eq!(index.constant("STRICT"), Some(ConstItem { value: Some(false) }));
            assert_eq!(index.method("validate"), Some(ReturnShape::OptionalError));
            assert_eq!(index.function("new"), Some(ReturnShape::Other));
            assert_eq!(index.function("lookup"), Some(ReturnShape::Optional));
            assert_eq!(index.method("new"), None);
        }

        #[test]
        fn conflicting_definitions_degrade() {
            let mut index = ItemIndex::from_file(&parse(
                "const FLAG: bool = true; fn check() -> Option<std::io::Error> { None }",
            ));
            let other = ItemIndex::from_file(&parse(
                "const FLAG: bool = false; fn check() -> Option<u8> { None }",
            ));
            index.merge(&other);
            assert_eq!(index.constant("FLAG"), Some(ConstItem { value: None }));
            assert_eq!(index.function("check"), Some(ReturnShape::Other));
        }
    }

    mod shape_tests {
        use super::*;

        fn shape(sig: &str) -> ReturnShape {
            let item: syn::ItemFn =
                syn::parse_str(&format!("{sig} {{ todo!() }}")).expect("signature parses");
            return_shape(&item.sig.output)
        }

        #[test]
        fn optional_errors() {
            assert_eq!(shape("fn a() -> Option<io::Error>"), ReturnShape::OptionalError);
            assert_eq!(
                shape("fn a() -> Option<Box<dyn std::error::Error + Send>>"),
                ReturnShape::OptionalError
            );
            assert_eq!(shape("fn a() -> Option<&'static dyn Error>"), ReturnShape::OptionalError);
            assert_eq!(shape("fn a() -> std::option::Option<ParseError>"), ReturnShape::OptionalError);
        }

        #[test]
        fn other_shapes() {
            assert_eq!(shape("fn a() -> Option<String>"), ReturnShape::Optional);
            assert_eq!(shape("fn a() -> Option<Box<str>>"), ReturnShape::Optional);
            assert_eq!(shape("fn a() -> Result<(), io::Error>"), ReturnShape::Other);
            assert_eq!(shape("fn a()"), ReturnShape::Other);
        }
    }

    mod import_tests {
        use super::*;

        #[test]
        fn aliases_expand_first_segment() {
            let imports = ImportMap::from_file(
                &parse(
                    r#"
                    use assertive::errors;
                    use assertive::errors::is as error_is;
                    use std::collections::{self, HashMap};
                    use crate::support::fixture;
                    use tokio::*;
                    "#,
                ),
                "my_crate",
            );
            assert_eq!(imports.resolve(&segs("errors::is")), segs("assertive::errors::is"));
            assert_eq!(imports.resolve(&segs("error_is")), segs("assertive::errors::is"));
            assert_eq!(
                imports.resolve(&segs("collections::BTreeMap")),
                segs("std::collections::BTreeMap")
            );
            assert_eq!(
                imports.resolve(&segs("HashMap::new")),
                segs("std::collections::HashMap::new")
            );
            assert_eq!(imports.resolve(&segs("fixture")), segs("my_crate::support::fixture"));
            assert_eq!(imports.resolve(&segs("crate::x")), segs("my_crate::x"));
            assert_eq!(imports.resolve(&segs("spawn")), segs("spawn"));
        }

        #[test]
        fn uses_inside_functions_count() {
            let imports = ImportMap::from_file(
                &parse("fn t() { use assertive::errors::is_type; }"),
                "pkg",
            );
            assert_eq!(imports.resolve(&segs("is_type")), segs("assertive::errors::is_type"));
        }
    }
}
