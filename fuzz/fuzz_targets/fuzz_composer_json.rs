#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ostinato_autoload::{AutoloadPathResolver, PackageMap, StaticProbe, VendorInstallPaths};
use ostinato_core::{AHashMap, load_installed, load_package};
use serde::Serialize;
use std::collections::HashMap;

/// Arbitrary manifest for structured fuzzing.
#[derive(Debug, Clone, Arbitrary, Serialize)]
struct FuzzManifest {
    name: Option<String>,
    version: Option<String>,
    #[serde(rename = "type")]
    package_type: Option<String>,
    #[serde(rename = "target-dir")]
    target_dir: Option<String>,
    require: HashMap<String, String>,
    #[serde(rename = "require-dev")]
    require_dev: HashMap<String, String>,
    provide: HashMap<String, String>,
    autoload: Option<FuzzAutoload>,
}

#[derive(Debug, Clone, Arbitrary, Serialize)]
struct FuzzAutoload {
    #[serde(rename = "psr-4")]
    psr4: Option<HashMap<String, String>>,
    #[serde(rename = "psr-0")]
    psr0: Option<HashMap<String, Vec<String>>>,
    classmap: Option<Vec<String>>,
    files: Option<Vec<String>>,
    #[serde(rename = "exclude-from-classmap")]
    exclude: Option<Vec<String>>,
}

fuzz_target!(|data: (FuzzManifest, Vec<FuzzManifest>)| {
    let (root, installed) = data;
    let (Ok(root_json), Ok(installed_json)) =
        (serde_json::to_string(&root), serde_json::to_string(&installed))
    else {
        return;
    };
    let (Ok(root), Ok(installed)) = (load_package(&root_json), load_installed(&installed_json))
    else {
        return;
    };

    let map = PackageMap::build(&root, &installed, &VendorInstallPaths::new("vendor"));
    let probe = StaticProbe::new("/project");
    let autoloads = AutoloadPathResolver::new(&probe).parse_autoloads(&map, &AHashMap::new());
    let _ = autoloads.classmap_exclusion();
});
