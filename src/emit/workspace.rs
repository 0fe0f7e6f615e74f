//! Aggregate workspace files: the Visual Studio solution and the Xcode workspace
//!
//! Projects are grouped by their group path and ordered by name inside each group, so
//! the output depends only on the project set and never on discovery order.

use std::collections::{BTreeMap, BTreeSet};

use super::ids::{folder_guid, vs_guid};
use super::{vcxproj, xcode, xml_escape, EmitResult, EmitSettings, Emitter};
use crate::model::ProjectDescriptor;
use crate::util::paths::{relative_to, to_backslashes, to_forward_slashes};

const CPP_PROJECT_TYPE: &str = "{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}";
const CSHARP_PROJECT_TYPE: &str = "{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}";
const FOLDER_TYPE: &str = "{2150E333-8FDC-42A3-9474-1A3956D46DE8}";

fn grouped(projects: &[ProjectDescriptor]) -> BTreeMap<Vec<String>, Vec<&ProjectDescriptor>> {
    let mut groups: BTreeMap<Vec<String>, Vec<&ProjectDescriptor>> = BTreeMap::new();
    for project in projects {
        groups.entry(project.group_path.clone()).or_default().push(project);
    }
    for members in groups.values_mut() {
        members.sort_by(|a, b| a.name.cmp(&b.name));
    }
    groups
}

fn folder_key(path: &[String]) -> String {
    path.join("/")
}

/// Renders `<name>.sln` with one solution folder per group path level.
pub fn render_solution(projects: &[ProjectDescriptor], settings: &EmitSettings) -> String {
    let groups = grouped(projects);
    let mut lines: Vec<String> = vec![
        "Microsoft Visual Studio Solution File, Format Version 12.00".to_string(),
        "# Visual Studio Version 17".to_string(),
        "VisualStudioVersion = 17.0.31903.59".to_string(),
        "MinimumVisualStudioVersion = 10.0.40219.1".to_string(),
    ];
    let mut configs = Vec::new();
    let mut nested = Vec::new();

    for (group_path, members) in &groups {
        let parent = folder_guid(&folder_key(group_path));
        for project in members {
            let guid = vs_guid(&project.name);
            let (type_guid, file) = if project.kind.is_managed() {
                (CSHARP_PROJECT_TYPE, relative_to(&project.source_file, &settings.project_root))
            } else {
                (
                    CPP_PROJECT_TYPE,
                    relative_to(&vcxproj::project_file(settings, project), &settings.project_root),
                )
            };
            lines.push(format!(
                "Project(\"{}\") = \"{}\", \"{}\", \"{}\"",
                type_guid,
                project.name,
                to_backslashes(&file),
                guid
            ));
            lines.push("EndProject".to_string());

            let platform = if project.kind.is_managed() { "Any CPU" } else { "x64" };
            for config in ["Debug", "Release"] {
                for solution_platform in ["Any CPU", "x64"] {
                    configs.push(format!(
                        "{guid}.{config}|{solution_platform}.ActiveCfg = {config}|{platform}"
                    ));
                    if project.kind.is_managed() || solution_platform == "x64" {
                        configs.push(format!(
                            "{guid}.{config}|{solution_platform}.Build.0 = {config}|{platform}"
                        ));
                    }
                }
            }
            nested.push(format!("{} = {}", guid, parent));
        }
    }

    let folders: BTreeSet<Vec<String>> = groups
        .keys()
        .flat_map(|path| (1..=path.len()).map(move |n| path[..n].to_vec()))
        .collect();
    for folder in &folders {
        let key = folder_key(folder);
        let label = folder.last().map(String::as_str).unwrap_or_default();
        lines.push(format!(
            "Project(\"{}\") = \"{}\", \"{}\", \"{}\"",
            FOLDER_TYPE,
            label,
            label,
            folder_guid(&key)
        ));
        lines.push("EndProject".to_string());
        if folder.len() > 1 {
            nested.push(format!(
                "{} = {}",
                folder_guid(&key),
                folder_guid(&folder_key(&folder[..folder.len() - 1]))
            ));
        }
    }

    lines.extend(
        [
            "Global",
            "\tGlobalSection(SolutionConfigurationPlatforms) = preSolution",
            "\t\tDebug|Any CPU = Debug|Any CPU",
            "\t\tDebug|x64 = Debug|x64",
            "\t\tRelease|Any CPU = Release|Any CPU",
            "\t\tRelease|x64 = Release|x64",
            "\tEndGlobalSection",
            "\tGlobalSection(ProjectConfigurationPlatforms) = postSolution",
        ]
        .map(String::from),
    );
    lines.extend(configs.into_iter().map(|c| format!("\t\t{}", c)));
    lines.push("\tEndGlobalSection".to_string());
    lines.push("\tGlobalSection(NestedProjects) = preSolution".to_string());
    lines.extend(nested.into_iter().map(|n| format!("\t\t{}", n)));
    lines.extend(
        [
            "\tEndGlobalSection",
            "\tGlobalSection(SolutionProperties) = preSolution",
            "\t\tHideSolutionNode = FALSE",
            "\tEndGlobalSection",
            "EndGlobal",
        ]
        .map(String::from),
    );

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Renders `contents.xcworkspacedata`; managed projects are left out.
pub fn render_xcworkspace(projects: &[ProjectDescriptor], settings: &EmitSettings) -> String {
    let mut lines = vec![
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>".to_string(),
        "<Workspace".to_string(),
        "   version = \"1.0\">".to_string(),
    ];

    for (group_path, members) in grouped(projects) {
        let native: Vec<_> = members.into_iter().filter(|p| !p.kind.is_managed()).collect();
        if native.is_empty() {
            continue;
        }
        lines.push("   <Group".to_string());
        lines.push("      location = \"container:\"".to_string());
        lines.push(format!("      name = \"{}\">", xml_escape(&folder_key(&group_path))));
        for project in native {
            let bundle =
                relative_to(&xcode::project_bundle(settings, project), &settings.project_root);
            lines.push("      <FileRef".to_string());
            lines.push(format!(
                "         location = \"group:{}\">",
                xml_escape(&to_forward_slashes(&bundle))
            ));
            lines.push("      </FileRef>".to_string());
        }
        lines.push("   </Group>".to_string());
    }

    lines.push("</Workspace>".to_string());
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub struct SolutionEmitter;

impl Emitter for SolutionEmitter {
    fn name(&self) -> &'static str {
        "solution"
    }

    fn generate(&self, projects: &[ProjectDescriptor], settings: &EmitSettings) -> EmitResult {
        let mut result = EmitResult::default();
        let path = settings
            .project_root
            .join(format!("{}.sln", settings.workspace_name));
        result.write(&settings.workspace_name, path, &render_solution(projects, settings));
        result
    }
}

pub struct XcodeWorkspaceEmitter;

impl Emitter for XcodeWorkspaceEmitter {
    fn name(&self) -> &'static str {
        "xcworkspace"
    }

    fn generate(&self, projects: &[ProjectDescriptor], settings: &EmitSettings) -> EmitResult {
        let mut result = EmitResult::default();
        let path = settings
            .project_root
            .join(format!("{}.xcworkspace", settings.workspace_name))
            .join("contents.xcworkspacedata");
        result.write(&settings.workspace_name, path, &render_xcworkspace(projects, settings));
        result
    }
}
