//! Priority tiers and role flags.
//!
//! Each tier is an ordered list of predicates over the lower-cased path; the
//! first tier with a matching predicate wins. Role flags are computed on
//! their own and never influence the tier.

use super::filter::extension;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusion order when ceilings are reached; `High` sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(label)
    }
}

/// Everything the classifier derives from a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub priority: Priority,
    pub language: Option<&'static str>,
    pub is_test: bool,
    pub is_config: bool,
    pub is_documentation: bool,
}

const SOURCE_ROOTS: &[&str] = &[
    "src/", "source/", "lib/", "app/", "components/", "pages/", "routes/", "controllers/",
    "services/", "models/", "utils/",
];

/// Extension to language name for recognised programming languages
const LANGUAGES: &[(&str, &str)] = &[
    ("rs", "Rust"), ("go", "Go"), ("c", "C"), ("h", "C"), ("cpp", "C++"), ("cc", "C++"),
    ("cxx", "C++"), ("hpp", "C++"), ("cs", "C#"), ("java", "Java"), ("kt", "Kotlin"),
    ("kts", "Kotlin"), ("scala", "Scala"), ("groovy", "Groovy"), ("clj", "Clojure"),
    ("js", "JavaScript"), ("jsx", "JavaScript"), ("mjs", "JavaScript"), ("cjs", "JavaScript"),
    ("ts", "TypeScript"), ("tsx", "TypeScript"), ("vue", "Vue"), ("svelte", "Svelte"),
    ("py", "Python"), ("rb", "Ruby"), ("php", "PHP"), ("swift", "Swift"), ("m", "Objective-C"),
    ("mm", "Objective-C++"), ("dart", "Dart"), ("lua", "Lua"), ("ex", "Elixir"), ("exs", "Elixir"),
    ("erl", "Erlang"), ("hs", "Haskell"), ("ml", "OCaml"), ("fs", "F#"), ("r", "R"),
    ("jl", "Julia"), ("zig", "Zig"), ("nim", "Nim"), ("pl", "Perl"), ("sh", "Shell"),
    ("bash", "Shell"), ("zsh", "Shell"), ("ps1", "PowerShell"), ("sql", "SQL"),
    ("html", "HTML"), ("css", "CSS"), ("scss", "SCSS"), ("sass", "Sass"), ("less", "Less"),
    ("sol", "Solidity"), ("proto", "Protocol Buffers"), ("graphql", "GraphQL"), ("tf", "HCL"),
];

/// Extensions that carry data or prose rather than code; used for language labels only
const DATA_LANGUAGES: &[(&str, &str)] = &[
    ("json", "JSON"), ("yaml", "YAML"), ("yml", "YAML"), ("toml", "TOML"), ("xml", "XML"),
    ("ini", "INI"), ("md", "Markdown"), ("markdown", "Markdown"), ("rst", "reStructuredText"),
];

const MANIFESTS: &[&str] = &[
    "package.json", "package-lock.json", "yarn.lock", "pnpm-lock.yaml", "requirements.txt",
    "requirements-dev.txt", "pyproject.toml", "setup.py", "setup.cfg", "pipfile", "pipfile.lock",
    "poetry.lock", "cargo.toml", "cargo.lock", "go.mod", "go.sum", "pom.xml", "build.gradle",
    "build.gradle.kts", "settings.gradle", "gemfile", "gemfile.lock", "composer.json",
    "composer.lock", "mix.exs", "pubspec.yaml", "project.clj", "cmakelists.txt",
];

const BUILD_DECLARATIONS: &[&str] = &[
    "dockerfile", "docker-compose.yml", "docker-compose.yaml", "compose.yml", "compose.yaml",
    ".env.example", ".env.sample", ".editorconfig", "tsconfig.json", "makefile", "procfile",
    "vagrantfile", "jenkinsfile",
];

const BUILD_DECLARATION_PREFIXES: &[&str] = &[".eslintrc", ".prettierrc", ".stylelintrc"];

const CONFIG_PREFIXES: &[&str] = &[
    "webpack.", "vite.", "rollup.", "babel.", "jest.", "vitest.", "karma.", "tailwind.", "postcss.",
    "next.config", "nuxt.config", "svelte.config", "astro.config", "tsconfig", "jsconfig",
    ".eslintrc", ".prettierrc", ".babelrc", ".stylelintrc", ".npmrc", ".nvmrc", ".gitignore",
    ".gitattributes", ".dockerignore", ".editorconfig",
];

const CONFIG_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml", "ini", "cfg", "conf", "xml", "properties"];

const DOC_STEMS: &[&str] = &[
    "readme", "changelog", "changes", "history", "contributing", "license", "licence", "authors",
    "code_of_conduct", "security", "notice",
];

const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "rst", "adoc"];

static TEST_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i:\.(test|spec)\.(js|jsx|ts|tsx|mjs|cjs)$)|(?i:^test_.+\.py$)|(?i:_test\.(py|go|rs)$)|(Tests?\.(java|cs|kt)$)|(?i:_spec\.rb$)",
    )
    .expect("test file pattern is valid")
});

type Predicate = fn(&str, &str, Option<&str>) -> bool;

/// Predicates that place a file in the high tier, checked in order
const HIGH_PRIORITY: &[Predicate] = &[is_under_source_root, is_source_code, is_manifest, is_build_declaration];

/// Predicates that place a file in the medium tier, checked in order
const MEDIUM_PRIORITY: &[Predicate] = &[is_config_file, is_documentation_file];

fn is_under_source_root(path: &str, _: &str, _: Option<&str>) -> bool {
    SOURCE_ROOTS.iter().any(|root| path.starts_with(root))
}

fn is_source_code(_: &str, _: &str, ext: Option<&str>) -> bool {
    ext.map_or(false, |ext| LANGUAGES.iter().any(|(e, _)| *e == ext))
}

fn is_manifest(_: &str, name: &str, _: Option<&str>) -> bool {
    MANIFESTS.contains(&name)
}

fn is_build_declaration(_: &str, name: &str, _: Option<&str>) -> bool {
    BUILD_DECLARATIONS.contains(&name)
        || name.starts_with("dockerfile.")
        || BUILD_DECLARATION_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

fn is_config_file(_: &str, name: &str, ext: Option<&str>) -> bool {
    CONFIG_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
        || ext.map_or(false, |ext| CONFIG_EXTENSIONS.contains(&ext))
}

fn is_documentation_file(_: &str, name: &str, ext: Option<&str>) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    DOC_STEMS.contains(&stem) || ext.map_or(false, |ext| DOC_EXTENSIONS.contains(&ext))
}

fn matches_any(predicates: &[Predicate], path: &str, name: &str, ext: Option<&str>) -> bool {
    predicates.iter().any(|predicate| predicate(path, name, ext))
}

/// Assigns a priority tier, a language and the three role flags to a path
pub fn classify(path: &str) -> Classification {
    let lower = path.to_ascii_lowercase();
    let lower = lower.trim_start_matches('/');
    let name = lower.rsplit('/').next().unwrap_or(lower);
    let ext = extension(lower);
    let ext = ext.as_deref();

    let priority = if matches_any(HIGH_PRIORITY, lower, name, ext) {
        Priority::High
    } else if matches_any(MEDIUM_PRIORITY, lower, name, ext) {
        Priority::Medium
    } else {
        Priority::Low
    };

    let file_name = path.rsplit('/').next().unwrap_or(path);

    Classification {
        priority,
        language: infer_language(path),
        is_test: TEST_FILE.is_match(file_name),
        is_config: is_config_file(lower, name, ext),
        is_documentation: is_documentation_file(lower, name, ext),
    }
}

/// Language label for a path, from its extension or a well-known file name
pub fn infer_language(path: &str) -> Option<&'static str> {
    let name = path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase();
    if name == "dockerfile" || name.starts_with("dockerfile.") {
        return Some("Dockerfile");
    }
    if name == "makefile" {
        return Some("Makefile");
    }

    let ext = extension(&name)?;
    LANGUAGES
        .iter()
        .chain(DATA_LANGUAGES.iter())
        .find(|(e, _)| *e == ext)
        .map(|(_, language)| *language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("src/app.ts", Priority::High; "source root and extension")]
    #[test_case("src/assets/data.bin.txt", Priority::High; "anything under a source root")]
    #[test_case("scripts/deploy.py", Priority::High; "source extension outside roots")]
    #[test_case("package.json", Priority::High; "manifest")]
    #[test_case("backend/Cargo.toml", Priority::High; "nested manifest")]
    #[test_case("Dockerfile", Priority::High; "container build")]
    #[test_case(".env.example", Priority::High; "env example")]
    #[test_case(".eslintrc.json", Priority::High; "linter config")]
    #[test_case("webpack.config.ts", Priority::High; "config written in a source language")]
    #[test_case("config/settings.yaml", Priority::Medium; "config extension")]
    #[test_case(".babelrc", Priority::Medium; "config prefix")]
    #[test_case("README.md", Priority::Medium; "readme")]
    #[test_case("LICENSE", Priority::Medium; "license without extension")]
    #[test_case("docs/guide.rst", Priority::Medium; "doc extension")]
    #[test_case("assets/icon.xcf", Priority::Low; "unknown")]
    #[test_case("Gemfile.local", Priority::Low; "near miss")]
    fn test_priority(path: &str, expected: Priority) {
        assert_eq!(classify(path).priority, expected);
    }

    #[test_case("src/app.test.ts", true; "jest test")]
    #[test_case("web/Button.spec.jsx", true; "spec file")]
    #[test_case("tests/test_parser.py", true; "pytest prefix")]
    #[test_case("pkg/server_test.go", true; "go test")]
    #[test_case("src/main/java/FooTest.java", true; "junit")]
    #[test_case("spec/models/user_spec.rb", true; "rspec")]
    #[test_case("src/testing.ts", false; "test word in name")]
    #[test_case("src/contest.py", false; "test inside word")]
    #[test_case("src/Contest.java", false; "lower case test suffix")]
    fn test_is_test(path: &str, expected: bool) {
        assert_eq!(classify(path).is_test, expected);
    }

    #[test]
    fn test_roles_are_independent_of_priority() {
        let test_file = classify("src/app.test.ts");
        assert_eq!(test_file.priority, Priority::High);
        assert!(test_file.is_test);
        assert!(!test_file.is_config);

        let tsconfig = classify("tsconfig.json");
        assert_eq!(tsconfig.priority, Priority::High);
        assert!(tsconfig.is_config);

        let readme = classify("README.md");
        assert_eq!(readme.priority, Priority::Medium);
        assert!(readme.is_documentation);
        assert!(!readme.is_config);

        let changelog = classify("src/CHANGELOG.md");
        assert_eq!(changelog.priority, Priority::High);
        assert!(changelog.is_documentation);
    }

    #[test]
    fn test_infer_language() {
        assert_eq!(infer_language("src/app.ts"), Some("TypeScript"));
        assert_eq!(infer_language("lib/Main.RS"), Some("Rust"));
        assert_eq!(infer_language("docker/Dockerfile"), Some("Dockerfile"));
        assert_eq!(infer_language("Makefile"), Some("Makefile"));
        assert_eq!(infer_language("README.md"), Some("Markdown"));
        assert_eq!(infer_language("LICENSE"), None);
        assert_eq!(infer_language("assets/icon.xcf"), None);
    }

    #[test]
    fn test_priority_order() {
        let mut tiers = vec![Priority::Low, Priority::High, Priority::Medium];
        tiers.sort();
        assert_eq!(tiers, vec![Priority::High, Priority::Medium, Priority::Low]);
    }

    proptest! {
        #[test]
        fn classification_is_idempotent(path in "[a-zA-Z0-9_./-]{1,48}") {
            prop_assert_eq!(classify(&path), classify(&path));
        }
    }
}
