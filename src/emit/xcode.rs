//! Xcode `project.pbxproj` generation
//!
//! The target has no sources phase; a single shell-script phase runs
//! `svcbuild build <unit>`. Object ids come from [`XcodeIds`] seeded with the project
//! name, so output is stable across runs.

use std::path::{Path, PathBuf};

use super::ids::XcodeIds;
use super::{EmitResult, EmitSettings, Emitter};
use crate::model::{FileGroup, ProjectDescriptor, ProjectKind};
use crate::util::paths::{relative_to, to_forward_slashes};

pub fn project_bundle(settings: &EmitSettings, project: &ProjectDescriptor) -> PathBuf {
    settings
        .project_dir(project)
        .join(format!("{}.xcodeproj", project.name))
}

/// Quoted pbxproj string literal.
fn quoted(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}

struct Product {
    product_type: &'static str,
    file_type: &'static str,
    file_name: String,
}

fn product(project: &ProjectDescriptor) -> Product {
    match project.kind {
        ProjectKind::StaticLibrary | ProjectKind::ManagedLibrary => Product {
            product_type: "com.apple.product-type.library.static",
            file_type: "archive.ar",
            file_name: format!("{}.a", project.name),
        },
        ProjectKind::DynamicLibrary => Product {
            product_type: "com.apple.product-type.library.dynamic",
            file_type: "compiled.mach-o.dylib",
            file_name: format!("{}.dylib", project.name),
        },
        ProjectKind::Executable | ProjectKind::ManagedExecutable => Product {
            product_type: "com.apple.product-type.tool",
            file_type: "compiled.mach-o.executable",
            file_name: project.name.clone(),
        },
    }
}

struct Ids {
    project: String,
    main_group: String,
    products_group: String,
    target: String,
    product_ref: String,
    build_phase: String,
    config_list_project: String,
    config_list_target: String,
    project_configs: [String; 2],
    target_configs: [String; 2],
}

impl Ids {
    fn allocate(ids: &mut XcodeIds) -> Self {
        Self {
            project: ids.next_id(),
            main_group: ids.next_id(),
            products_group: ids.next_id(),
            target: ids.next_id(),
            product_ref: ids.next_id(),
            build_phase: ids.next_id(),
            config_list_project: ids.next_id(),
            config_list_target: ids.next_id(),
            project_configs: [ids.next_id(), ids.next_id()],
            target_configs: [ids.next_id(), ids.next_id()],
        }
    }
}

/// Shell script the build phase runs.
pub fn build_script(
    project: &ProjectDescriptor,
    settings: &EmitSettings,
    project_dir: &Path,
) -> String {
    format!(
        "{} --project-root \"$PROJECT_DIR/{}\" build {}",
        settings.orchestrator_bin,
        to_forward_slashes(&settings.root_from(project_dir)),
        project.name
    )
}

pub fn render(project: &ProjectDescriptor, settings: &EmitSettings) -> String {
    let project_dir = settings.project_dir(project);
    let mut id_source = XcodeIds::new(&project.name);
    let ids = Ids::allocate(&mut id_source);

    let groups: Vec<(FileGroup, String)> = FileGroup::ALL
        .into_iter()
        .filter(|g| !project.files(*g).is_empty())
        .map(|g| (g, id_source.next_id()))
        .collect();
    let files: Vec<(FileGroup, String, String, String, &'static str)> = project
        .all_files()
        .map(|(group, entry)| {
            (
                group,
                id_source.next_id(),
                entry.file_name(),
                to_forward_slashes(&relative_to(&entry.path, &project_dir)),
                entry.kind.xcode_type(),
            )
        })
        .collect();
    let product = product(project);

    let mut out: Vec<String> = vec![
        "// !$*UTF8*$!".to_string(),
        "{".to_string(),
        "\tarchiveVersion = 1;".to_string(),
        "\tclasses = {".to_string(),
        "\t};".to_string(),
        "\tobjectVersion = 46;".to_string(),
        "\tobjects = {".to_string(),
    ];

    out.push(format!("\t\t{} /* Project object */ = {{", ids.project));
    out.push("\t\t\tisa = PBXProject;".to_string());
    out.push("\t\t\tattributes = {".to_string());
    out.push("\t\t\t\tLastUpgradeCheck = 9999;".to_string());
    out.push("\t\t\t};".to_string());
    out.push(format!("\t\t\tbuildConfigurationList = {};", ids.config_list_project));
    out.push("\t\t\tcompatibilityVersion = \"Xcode 3.2\";".to_string());
    out.push(format!("\t\t\tmainGroup = {};", ids.main_group));
    out.push(format!("\t\t\tproductRefGroup = {};", ids.products_group));
    out.push("\t\t\ttargets = (".to_string());
    out.push(format!("\t\t\t\t{},", ids.target));
    out.push("\t\t\t);".to_string());
    out.push("\t\t};".to_string());

    out.push(format!("\t\t{} /* Main Group */ = {{", ids.main_group));
    out.push("\t\t\tisa = PBXGroup;".to_string());
    out.push("\t\t\tchildren = (".to_string());
    for (group, id) in &groups {
        out.push(format!("\t\t\t\t{} /* {} */,", id, group));
    }
    out.push(format!("\t\t\t\t{} /* Products */,", ids.products_group));
    out.push("\t\t\t);".to_string());
    out.push("\t\t\tsourceTree = \"<group>\";".to_string());
    out.push("\t\t};".to_string());

    out.push(format!("\t\t{} /* Products */ = {{", ids.products_group));
    out.push("\t\t\tisa = PBXGroup;".to_string());
    out.push("\t\t\tchildren = (".to_string());
    out.push(format!("\t\t\t\t{} /* {} */,", ids.product_ref, product.file_name));
    out.push("\t\t\t);".to_string());
    out.push("\t\t\tname = Products;".to_string());
    out.push("\t\t\tsourceTree = \"<group>\";".to_string());
    out.push("\t\t};".to_string());

    for (group, id) in &groups {
        out.push(format!("\t\t{} /* {} */ = {{", id, group));
        out.push("\t\t\tisa = PBXGroup;".to_string());
        out.push("\t\t\tchildren = (".to_string());
        for (_, file_id, name, _, _) in files.iter().filter(|f| f.0 == *group) {
            out.push(format!("\t\t\t\t{} /* {} */,", file_id, name));
        }
        out.push("\t\t\t);".to_string());
        out.push(format!("\t\t\tname = {};", quoted(group.as_str())));
        out.push("\t\t\tsourceTree = \"<group>\";".to_string());
        out.push("\t\t};".to_string());
    }

    out.push(format!("\t\t{} /* {} */ = {{", ids.target, project.name));
    out.push("\t\t\tisa = PBXNativeTarget;".to_string());
    out.push(format!("\t\t\tbuildConfigurationList = {};", ids.config_list_target));
    out.push("\t\t\tbuildPhases = (".to_string());
    out.push(format!("\t\t\t\t{} /* svcbuild */,", ids.build_phase));
    out.push("\t\t\t);".to_string());
    out.push("\t\t\tbuildRules = (".to_string());
    out.push("\t\t\t);".to_string());
    out.push("\t\t\tdependencies = (".to_string());
    out.push("\t\t\t);".to_string());
    out.push(format!("\t\t\tname = {};", quoted(&project.name)));
    out.push(format!("\t\t\tproductName = {};", quoted(&project.name)));
    out.push(format!("\t\t\tproductReference = {};", ids.product_ref));
    out.push(format!("\t\t\tproductType = {};", quoted(product.product_type)));
    out.push("\t\t};".to_string());

    for (_, id, name, path, file_type) in &files {
        out.push(format!("\t\t{} /* {} */ = {{", id, name));
        out.push("\t\t\tisa = PBXFileReference;".to_string());
        out.push(format!("\t\t\tlastKnownFileType = {};", file_type));
        out.push(format!("\t\t\tname = {};", quoted(name)));
        out.push(format!("\t\t\tpath = {};", quoted(path)));
        out.push("\t\t\tsourceTree = \"<group>\";".to_string());
        out.push("\t\t};".to_string());
    }

    out.push(format!("\t\t{} /* {} */ = {{", ids.product_ref, product.file_name));
    out.push("\t\t\tisa = PBXFileReference;".to_string());
    out.push(format!("\t\t\texplicitFileType = {};", quoted(product.file_type)));
    out.push("\t\t\tincludeInIndex = 0;".to_string());
    out.push(format!("\t\t\tpath = {};", quoted(&product.file_name)));
    out.push("\t\t\tsourceTree = BUILT_PRODUCTS_DIR;".to_string());
    out.push("\t\t};".to_string());

    out.push(format!("\t\t{} /* svcbuild */ = {{", ids.build_phase));
    out.push("\t\t\tisa = PBXShellScriptBuildPhase;".to_string());
    out.push("\t\t\tbuildActionMask = 2147483647;".to_string());
    for list in ["files", "inputFileListPaths", "inputPaths"] {
        out.push(format!("\t\t\t{} = (", list));
        out.push("\t\t\t);".to_string());
    }
    out.push("\t\t\tname = svcbuild;".to_string());
    for list in ["outputFileListPaths", "outputPaths"] {
        out.push(format!("\t\t\t{} = (", list));
        out.push("\t\t\t);".to_string());
    }
    out.push("\t\t\trunOnlyForDeploymentPostprocessing = 0;".to_string());
    out.push("\t\t\tshellPath = /bin/sh;".to_string());
    out.push(format!(
        "\t\t\tshellScript = {};",
        quoted(&build_script(project, settings, &project_dir))
    ));
    out.push("\t\t};".to_string());

    for (id, name) in ids.project_configs.iter().zip(["Debug", "Release"]) {
        push_project_config(&mut out, id, name, &settings.cxx_standard);
    }
    let header_paths: Vec<String> = project
        .include_dirs
        .iter()
        .map(|dir| format!("$(SRCROOT)/{}", to_forward_slashes(&relative_to(dir, &project_dir))))
        .collect();
    for (id, name) in ids.target_configs.iter().zip(["Debug", "Release"]) {
        out.push(format!("\t\t{} /* {} */ = {{", id, name));
        out.push("\t\t\tisa = XCBuildConfiguration;".to_string());
        out.push("\t\t\tbuildSettings = {".to_string());
        out.push("\t\t\t\tPRODUCT_NAME = \"$(TARGET_NAME)\";".to_string());
        out.push("\t\t\t\tUSER_HEADER_SEARCH_PATHS = (".to_string());
        for path in &header_paths {
            out.push(format!("\t\t\t\t\t{},", quoted(path)));
        }
        out.push("\t\t\t\t);".to_string());
        out.push("\t\t\t};".to_string());
        out.push(format!("\t\t\tname = {};", name));
        out.push("\t\t};".to_string());
    }

    for (list_id, kind, configs) in [
        (&ids.config_list_project, "PBXProject", &ids.project_configs),
        (&ids.config_list_target, "PBXNativeTarget", &ids.target_configs),
    ] {
        out.push(format!(
            "\t\t{} /* Build configuration list for {} */ = {{",
            list_id, kind
        ));
        out.push("\t\t\tisa = XCConfigurationList;".to_string());
        out.push("\t\t\tbuildConfigurations = (".to_string());
        for config in configs {
            out.push(format!("\t\t\t\t{},", config));
        }
        out.push("\t\t\t);".to_string());
        out.push("\t\t\tdefaultConfigurationIsVisible = 0;".to_string());
        out.push("\t\t\tdefaultConfigurationName = Release;".to_string());
        out.push("\t\t};".to_string());
    }

    out.push("\t};".to_string());
    out.push(format!("\trootObject = {} /* Project object */;", ids.project));
    out.push("}".to_string());

    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn push_project_config(out: &mut Vec<String>, id: &str, name: &str, cxx_standard: &str) {
    let debug = name == "Debug";
    out.push(format!("\t\t{} /* {} */ = {{", id, name));
    out.push("\t\t\tisa = XCBuildConfiguration;".to_string());
    out.push("\t\t\tbuildSettings = {".to_string());
    out.push("\t\t\t\tALWAYS_SEARCH_USER_PATHS = NO;".to_string());
    out.push(format!("\t\t\t\tCLANG_CXX_LANGUAGE_STANDARD = {};", quoted(cxx_standard)));
    out.push("\t\t\t\tCLANG_ENABLE_MODULES = YES;".to_string());
    out.push("\t\t\t\tCLANG_WARN_EMPTY_BODY = YES;".to_string());
    out.push("\t\t\t\tCLANG_WARN_UNREACHABLE_CODE = YES;".to_string());
    out.push("\t\t\t\tCOPY_PHASE_STRIP = NO;".to_string());
    if debug {
        out.push("\t\t\t\tDEBUG_INFORMATION_FORMAT = dwarf;".to_string());
        out.push("\t\t\t\tGCC_OPTIMIZATION_LEVEL = 0;".to_string());
        out.push("\t\t\t\tGCC_PREPROCESSOR_DEFINITIONS = (".to_string());
        out.push("\t\t\t\t\t\"DEBUG=1\",".to_string());
        out.push("\t\t\t\t\t\"$(inherited)\",".to_string());
        out.push("\t\t\t\t);".to_string());
        out.push("\t\t\t\tONLY_ACTIVE_ARCH = YES;".to_string());
    } else {
        out.push("\t\t\t\tDEBUG_INFORMATION_FORMAT = \"dwarf-with-dsym\";".to_string());
        out.push("\t\t\t\tENABLE_NS_ASSERTIONS = NO;".to_string());
    }
    out.push("\t\t\t\tMACOSX_DEPLOYMENT_TARGET = 10.15;".to_string());
    out.push("\t\t\t\tSDKROOT = macosx;".to_string());
    out.push("\t\t\t};".to_string());
    out.push(format!("\t\t\tname = {};", name));
    out.push("\t\t};".to_string());
}

pub struct XcodeEmitter;

impl Emitter for XcodeEmitter {
    fn name(&self) -> &'static str {
        "xcode"
    }

    fn generate(&self, projects: &[ProjectDescriptor], settings: &EmitSettings) -> EmitResult {
        let mut result = EmitResult::default();
        for project in projects.iter().filter(|p| !p.kind.is_managed()) {
            let path = project_bundle(settings, project).join("project.pbxproj");
            result.write(&project.name, path, &render(project, settings));
        }
        result
    }
}
