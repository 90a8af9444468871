/// Upstream SpiderMonkey snapshot to build against.
pub const SPIDERMONKEY_TAG: &str = "1.8.1pre";

/// Archive endpoint the tagged snapshot is served from.
pub const SPIDERMONKEY_ARCHIVE_BASE: &str = "http://hg.toolness.com/spidermonkey/archive";

/// Name of the extension module produced by `build`.
pub const EXTENSION_NAME: &str = "pymonkey";

/// C++ sources of the extension module, relative to the project root.
pub const EXTENSION_SOURCES: &[&str] = &[
  "pymonkey.cpp",
  "utils.cpp",
  "object.cpp",
  "function.cpp",
  "undefined.cpp",
  "context.cpp",
  "runtime.cpp",
];

pub const PACKAGE_VERSION: &str = "0.0.1";
pub const PACKAGE_DESCRIPTION: &str = "Access SpiderMonkey from Python";
pub const PACKAGE_AUTHOR: &str = "Atul Varma";
pub const PACKAGE_AUTHOR_EMAIL: &str = "atul@mozilla.com";
pub const PACKAGE_URL: &str = "http://www.toolness.com";

/// Script holding the extension's primary test suite, relative to the project root.
pub const TEST_SCRIPT: &str = "test_pymonkey.py";

/// Read size used while streaming the source archive.
pub const DOWNLOAD_CHUNK_SIZE: usize = 65536;

pub const ENV_ROOT: &str = "PAVEMENT_ROOT";
pub const ENV_PYTHON: &str = "PAVEMENT_PYTHON";
pub const ENV_SOURCE_URL: &str = "PAVEMENT_SOURCE_URL";
pub const ENV_SOURCE_SHA256: &str = "PAVEMENT_SOURCE_SHA256";
pub const ENV_MAKE: &str = "MAKE";

/// Module search path consumed by the Python interpreter.
pub const PYTHON_PATH_VAR: &str = "PYTHONPATH";
