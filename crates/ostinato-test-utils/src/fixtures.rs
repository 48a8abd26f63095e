//! Pre-built manifests for common autoload scenarios.

use serde_json::{Value, json};

/// Collection of pre-built test fixtures.
#[derive(Debug)]
pub struct Fixtures;

impl Fixtures {
    /// Root manifest with production and dev requirements and every autoload
    /// type.
    #[must_use]
    pub fn app_composer_json() -> Value {
        json!({
            "name": "acme/app",
            "type": "project",
            "minimum-stability": "stable",
            "require": {
                "php": ">=8.1",
                "acme/http": "^2.0",
                "acme/legacy": "^1.0"
            },
            "require-dev": {
                "acme/testing": "^1.0@beta"
            },
            "autoload": {
                "psr-4": {"App\\": "src/"},
                "classmap": ["database/"],
                "files": ["src/helpers.php"],
                "exclude-from-classmap": ["/tests/"]
            },
            "autoload-dev": {
                "psr-4": {"App\\Tests\\": "tests/"}
            },
            "config": {"vendor-dir": "vendor"}
        })
    }

    /// Installed packages matching [`Self::app_composer_json`], in the
    /// `{"packages": [...]}` layout.
    #[must_use]
    pub fn installed_json() -> Value {
        json!({
            "packages": [
                {
                    "name": "acme/http",
                    "version": "2.3.1",
                    "type": "library",
                    "require": {"acme/log": "^1.0"},
                    "autoload": {
                        "psr-4": {"Acme\\Http\\": "src/"},
                        "files": ["src/functions.php"]
                    }
                },
                {
                    "name": "acme/testing",
                    "version": "1.0.0-beta2",
                    "require": {"acme/log": "^1.0"},
                    "autoload": {"psr-4": {"Acme\\Testing\\": "src/"}}
                },
                {
                    "name": "acme/legacy",
                    "version": "1.4.0",
                    "target-dir": "Acme/Legacy",
                    "autoload": {
                        "psr-0": {"Acme_Legacy_": ""},
                        "classmap": ["lib/"]
                    }
                },
                {
                    "name": "acme/log",
                    "version": "dev-main",
                    "extra": {"branch-alias": {"dev-main": "1.x-dev"}},
                    "autoload": {
                        "psr-4": {"Acme\\Log\\": "src/", "Acme\\": "compat/"},
                        "files": ["src/bootstrap.php"]
                    }
                }
            ],
            "dev": true
        })
    }

    /// A package whose `psr-4` section is a bare string.
    #[must_use]
    pub fn malformed_psr4_package() -> Value {
        json!({
            "name": "acme/broken",
            "version": "1.0.0",
            "autoload": {
                "psr-4": "src/",
                "classmap": ["lib/"]
            }
        })
    }
}
