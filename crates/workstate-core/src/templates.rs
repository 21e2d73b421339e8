//! `.workstateignore` templates per development tool.

use crate::error::{Error, Result};
use crate::rules::IGNORE_FILE;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Tools with a bundled ignore template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeTool {
    Node,
    React,
    Angular,
    Java,
    C,
    Cpp,
    CSharp,
    Php,
    Python,
    Default,
}

const COMMON: &str = "\
# Version control
.git/
.svn/
.hg/

# Editors and OS files
.idea/
.vscode/
*.swp
*~
.DS_Store
Thumbs.db

# workstate downloads
downloads/
";

const NODE: &str = "\
# Dependencies
node_modules/
.pnpm-store/
bower_components/

# Build output
dist/
build/
coverage/
.next/
.nuxt/
.turbo/
.cache/

# Logs
*.log
npm-debug.log*
yarn-debug.log*
yarn-error.log*
";

const REACT: &str = "\
# Dependencies
node_modules/

# Build output
build/
dist/
coverage/
.cache/
.parcel-cache/
storybook-static/

# Logs
*.log
npm-debug.log*
yarn-error.log*
";

const ANGULAR: &str = "\
# Dependencies
node_modules/

# Build output
dist/
tmp/
out-tsc/
coverage/
.angular/cache/
.sass-cache/

# Logs
*.log
npm-debug.log*
";

const JAVA: &str = "\
# Build output
target/
build/
out/
bin/
*.class

# Build tools
.gradle/
.mvn/wrapper/maven-wrapper.jar

# Logs
*.log
hs_err_pid*
";

const C: &str = "\
# Objects and binaries
*.o
*.obj
*.a
*.lib
*.so
*.dylib
*.dll
*.exe
*.out

# Build output
build/
cmake-build-*/
CMakeFiles/
CMakeCache.txt
";

const CPP: &str = "\
# Objects and binaries
*.o
*.obj
*.a
*.lib
*.so
*.dylib
*.dll
*.exe
*.out
*.pch
*.gch

# Build output
build/
cmake-build-*/
CMakeFiles/
CMakeCache.txt
.cache/clangd/
";

const CSHARP: &str = "\
# Build output
bin/
obj/
[Dd]ebug/
[Rr]elease/
*.user
*.suo

# Packages
packages/
*.nupkg
.vs/
";

const PHP: &str = "\
# Dependencies
vendor/
node_modules/

# Caches and logs
.phpunit.result.cache
storage/logs/
storage/framework/cache/
bootstrap/cache/
*.log
";

const PYTHON: &str = "\
# Bytecode
__pycache__/
*.py[cod]

# Virtual environments
.venv/
venv/
env/

# Build and tooling output
build/
dist/
*.egg-info/
.pytest_cache/
.mypy_cache/
.ruff_cache/
.tox/
htmlcov/
.coverage
";

const DEFAULT: &str = "\
# Logs and temporary files
*.log
*.tmp
tmp/
";

impl CodeTool {
    /// All tools, in display order.
    pub const ALL: [CodeTool; 10] = [
        CodeTool::Node,
        CodeTool::React,
        CodeTool::Angular,
        CodeTool::Java,
        CodeTool::C,
        CodeTool::Cpp,
        CodeTool::CSharp,
        CodeTool::Php,
        CodeTool::Python,
        CodeTool::Default,
    ];

    /// Identifier used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::React => "react",
            Self::Angular => "angular",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "c++",
            Self::CSharp => "c#",
            Self::Php => "php",
            Self::Python => "python",
            Self::Default => "default",
        }
    }

    /// Comma-separated list of valid identifiers.
    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(CodeTool::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Full ignore-file text for this tool.
    pub fn template(&self) -> String {
        let specific = match self {
            Self::Node => NODE,
            Self::React => REACT,
            Self::Angular => ANGULAR,
            Self::Java => JAVA,
            Self::C => C,
            Self::Cpp => CPP,
            Self::CSharp => CSHARP,
            Self::Php => PHP,
            Self::Python => PYTHON,
            Self::Default => DEFAULT,
        };
        format!("{}\n{}", COMMON, specific)
    }
}

impl fmt::Display for CodeTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeTool {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == wanted)
            .ok_or_else(|| Error::UnknownTool {
                name: s.to_string(),
                valid: Self::valid_values(),
            })
    }
}

/// Writes the template for `tool` to `<root>/.workstateignore`.
///
/// An existing file is left alone unless `overwrite` is set. Returns whether
/// the file was written.
pub fn write_ignore_file(root: &Path, tool: CodeTool, overwrite: bool) -> Result<bool> {
    let path = root.join(IGNORE_FILE);
    if path.exists() && !overwrite {
        tracing::debug!("{} already exists, leaving it untouched", path.display());
        return Ok(false);
    }

    std::fs::write(&path, tool.template()).map_err(|e| Error::filesystem(&path, e))?;
    tracing::info!("Wrote {} template to {}", tool, path.display());
    Ok(true)
}
