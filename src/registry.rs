//! Category registry: warning category to scope extraction policy.
use std::collections::BTreeMap;
use std::num::NonZeroU32;

use crate::types::{DEFAULT_WINDOW, ScopeKind};

/// Built-in policy of a category before the window size is known.
#[derive(Debug, Clone, Copy)]
enum Builtin {
    /// A fixed scope kind.
    Fixed(ScopeKind),
    /// A window of the registry's default size.
    Window,
}

/// Categories tied to one method or constructor.
const METHOD: &[&str] = &[
    "CovariantEquals",
    "EqualsAvoidNull",
    "EqualsHashCode",
    "HiddenField",
    "JavadocMethod",
    "MethodLength",
    "MethodName",
    "MethodParamPad",
    "MethodTypeParameterName",
    "ParameterAssignment",
    "ParameterName",
    "ParameterNumber",
    "SuperClone",
    "SuperFinalize",
    "ThrowsCount",
];

/// Categories about a handful of statements around the line.
const WINDOW: &[&str] = &[
    "AnonInnerLength",
    "ArrayTypeStyle",
    "AvoidNestedBlocks",
    "BooleanExpressionComplexity",
    "DefaultComesLast",
    "EmptyBlock",
    "EmptyForIteratorPad",
    "EmptyStatement",
    "FallThrough",
    "FileTabCharacter",
    "GenericWhitespace",
    "IllegalCatch",
    "IllegalThrows",
    "InnerAssignment",
    "JavaNCSS",
    "LeftCurly",
    "LocalFinalVariableName",
    "LocalVariableName",
    "MissingSwitchDefault",
    "ModifiedControlVariable",
    "MultipleVariableDeclarations",
    "NeedBraces",
    "NestedForDepth",
    "NestedIfDepth",
    "NestedTryDepth",
    "NoWhitespaceAfter",
    "NoWhitespaceBefore",
    "NPathComplexity",
    "OneStatementPerLine",
    "OperatorWrap",
    "ParenPad",
    "RightCurly",
    "SimplifyBooleanExpression",
    "SimplifyBooleanReturn",
    "StringLiteralEquality",
    "TypecastParenPad",
    "UnnecessaryParentheses",
    "UpperEll",
    "WhitespaceAfter",
    "WhitespaceAround",
];

/// Categories about the file as a whole.
const FILE: &[&str] = &[
    "ClassDataAbstractionCoupling",
    "ClassFanOutComplexity",
    "FileLength",
    "IllegalImport",
    "InterfaceIsType",
    "OuterTypeFilename",
    "PackageDeclaration",
];

/// Categories about the innermost class.
const CLASS: &[&str] = &[
    "ClassTypeParameterName",
    "FinalClass",
    "HideUtilityClassConstructor",
    "JavadocType",
    "JUnitTestCase",
    "MultipleStringLiterals",
    "MutableException",
    "TypeName",
];

/// Categories about the outermost class.
const OUTER_CLASS: &[&str] = &["InnerTypeLast"];

/// Categories about modifiers or annotations on a member or type.
const METHOD_OR_CLASS: &[&str] = &[
    "AnnotationUseStyle",
    "JavadocStyle",
    "MissingDeprecated",
    "ModifierOrder",
    "RedundantModifier",
    "VisibilityModifier",
];

/// Categories about field declarations.
const FIELDS: &[&str] = &[
    "ConstantName",
    "ExplicitInitialization",
    "JavadocVariable",
    "MemberName",
    "StaticVariableName",
];

/// Categories about the package name.
const PACKAGE: &[&str] = &["PackageName"];

/// Reduce a category to its lookup key: last dotted segment without a
/// trailing `Check`.
pub fn normalize(category: &str) -> &str {
    let trimmed = category.trim();
    let last = trimmed.rsplit('.').next().unwrap_or(trimmed);
    return match last.strip_suffix("Check") {
        Some(stem) if !stem.is_empty() => stem,
        _ => last,
    };
}

/// Read-only mapping from warning categories to scope kinds.
///
/// Built once from the built-in table plus configured overrides and shared
/// by every worker of a batch.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    /// Built-in policies keyed by normalized category.
    builtins: BTreeMap<&'static str, Builtin>,
    /// Configured policies keyed by normalized category; win over built-ins.
    overrides: BTreeMap<String, ScopeKind>,
    /// Size of built-in windows and of the fallback for unknown categories.
    window: NonZeroU32,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        return Self::new(DEFAULT_WINDOW);
    }
}

impl CategoryRegistry {
    /// Every known category with its effective scope kind, sorted by name.
    pub fn entries(&self) -> Vec<(String, ScopeKind)> {
        let mut merged: BTreeMap<String, ScopeKind> = self
            .builtins
            .iter()
            .map(|(name, builtin)| return ((*name).to_string(), self.resolve(*builtin)))
            .collect();
        for (name, kind) in &self.overrides {
            merged.insert(name.clone(), *kind);
        }
        return merged.into_iter().collect();
    }

    /// Whether the category has a built-in or configured policy.
    pub fn is_known(&self, category: &str) -> bool {
        let key = normalize(category);
        return self.overrides.contains_key(key) || self.builtins.contains_key(key);
    }

    /// Scope kind for a category. Unknown categories get a window of the
    /// default size.
    pub fn lookup(&self, category: &str) -> ScopeKind {
        let key = normalize(category);
        if let Some(kind) = self.overrides.get(key) {
            return *kind;
        }
        return match self.builtins.get(key) {
            Some(builtin) => self.resolve(*builtin),
            None => {
                tracing::debug!(category, "unknown category, using the surrounding window");
                ScopeKind::SurroundingWindow(self.window)
            },
        };
    }

    /// Registry of the built-in table with windows of `window` lines.
    pub fn new(window: NonZeroU32) -> Self {
        let groups: [(&[&str], Builtin); 8] = [
            (CLASS, Builtin::Fixed(ScopeKind::WholeClass { include_nested_only: true })),
            (FIELDS, Builtin::Fixed(ScopeKind::Fields)),
            (FILE, Builtin::Fixed(ScopeKind::File)),
            (METHOD, Builtin::Fixed(ScopeKind::Method)),
            (METHOD_OR_CLASS, Builtin::Fixed(ScopeKind::MethodOrClass)),
            (OUTER_CLASS, Builtin::Fixed(ScopeKind::WholeClass { include_nested_only: false })),
            (PACKAGE, Builtin::Fixed(ScopeKind::PackageDeclaration)),
            (WINDOW, Builtin::Window),
        ];

        let builtins = groups
            .iter()
            .flat_map(|(names, builtin)| return names.iter().map(move |name| return (*name, *builtin)))
            .collect();

        return Self {
            builtins,
            overrides: BTreeMap::new(),
            window,
        };
    }

    /// Window size used by built-in windows and unknown categories.
    pub const fn window(&self) -> NonZeroU32 {
        return self.window;
    }

    /// Add configured policies. Keys are normalized like lookups.
    #[must_use]
    pub fn with_overrides<I, S>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, ScopeKind)>,
        S: AsRef<str>,
    {
        for (category, kind) in overrides {
            self.overrides.insert(normalize(category.as_ref()).to_string(), kind);
        }
        return self;
    }

    /// Effective scope kind of a built-in policy.
    const fn resolve(&self, builtin: Builtin) -> ScopeKind {
        return match builtin {
            Builtin::Fixed(kind) => kind,
            Builtin::Window => ScopeKind::SurroundingWindow(self.window),
        };
    }
}
