//! Visual Studio `.vcxproj` and `.vcxproj.filters` files
//!
//! Projects are `Utility` projects: files are listed as `None` items for browsing and
//! the only build action is a PreBuildEvent running `svcbuild build <unit>`.

use std::path::{Path, PathBuf};

use super::ids::vs_guid;
use super::{xml_escape, EmitResult, EmitSettings, Emitter};
use crate::model::{FileEntry, FileGroup, ProjectDescriptor};
use crate::util::paths::{relative_to, to_backslashes};

const MSBUILD_NS: &str = "http://schemas.microsoft.com/developer/msbuild/2003";
const CONFIGURATIONS: [&str; 2] = ["Debug", "Release"];

/// Listing order inside both files.
const ITEM_ORDER: [FileGroup; 4] = [
    FileGroup::Sources,
    FileGroup::Headers,
    FileGroup::Meta,
    FileGroup::Configs,
];

struct Filter {
    group: FileGroup,
    guid: &'static str,
    extensions: Option<&'static str>,
}

const FILTERS: [Filter; 4] = [
    Filter {
        group: FileGroup::Headers,
        guid: "{93995380-89BD-4b04-88EB-625FBE52EBFB}",
        extensions: Some("h;hh;hpp;hxx;h++;hm;inl;inc;ipp;xsd"),
    },
    Filter {
        group: FileGroup::Sources,
        guid: "{4FC737F1-C7A5-4376-A066-2A32D752A2FF}",
        extensions: Some("cpp;c;cc;cxx;c++;cppm;ixx;def;odl;idl;hpj;bat;asm;asmx"),
    },
    Filter {
        group: FileGroup::Configs,
        guid: "{67DA6AB6-F800-4c08-8B7A-83BB121AAD01}",
        extensions: Some(
            "rc;ico;cur;bmp;dlg;rc2;rct;bin;rgs;gif;jpg;jpeg;jpe;resx;tiff;tif;png;wav;mfcribbon-ms",
        ),
    },
    Filter {
        group: FileGroup::Meta,
        guid: "{50E4BC84-97C0-4d2e-A7E7-F3D35DB497D0}",
        extensions: None,
    },
];

pub fn project_file(settings: &EmitSettings, project: &ProjectDescriptor) -> PathBuf {
    settings
        .project_dir(project)
        .join(format!("{}.vcxproj", project.name))
}

fn condition(config: &str) -> String {
    format!("'$(Configuration)|$(Platform)'=='{}|x64'", config)
}

fn items(project: &ProjectDescriptor) -> impl Iterator<Item = (FileGroup, &FileEntry)> {
    ITEM_ORDER
        .into_iter()
        .flat_map(move |group| project.files(group).iter().map(move |e| (group, e)))
}

fn item_path(entry: &FileEntry, project_dir: &Path) -> String {
    xml_escape(&to_backslashes(&relative_to(&entry.path, project_dir)))
}

/// The PreBuildEvent command: rebuild the unit through the orchestrator.
pub fn build_command(
    project: &ProjectDescriptor,
    settings: &EmitSettings,
    project_dir: &Path,
) -> String {
    format!(
        "{} --project-root \"$(ProjectDir){}\" build {}",
        settings.orchestrator_bin,
        to_backslashes(&settings.root_from(project_dir)),
        project.name
    )
}

pub fn render_project(project: &ProjectDescriptor, settings: &EmitSettings) -> String {
    let project_dir = settings.project_dir(project);
    let mut lines: Vec<String> = vec![
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>".to_string(),
        format!("<Project DefaultTargets=\"Build\" xmlns=\"{}\">", MSBUILD_NS),
        "  <ItemGroup Label=\"ProjectConfigurations\">".to_string(),
    ];
    for config in CONFIGURATIONS {
        lines.push(format!("    <ProjectConfiguration Include=\"{}|x64\">", config));
        lines.push(format!("      <Configuration>{}</Configuration>", config));
        lines.push("      <Platform>x64</Platform>".to_string());
        lines.push("    </ProjectConfiguration>".to_string());
    }
    lines.push("  </ItemGroup>".to_string());

    lines.push("  <PropertyGroup Label=\"Globals\">".to_string());
    lines.push("    <VCProjectVersion>16.0</VCProjectVersion>".to_string());
    lines.push("    <Keyword>Win32Proj</Keyword>".to_string());
    lines.push(format!("    <ProjectGuid>{}</ProjectGuid>", vs_guid(&project.name)));
    lines.push(format!("    <RootNamespace>{}</RootNamespace>", xml_escape(&project.name)));
    lines.push("    <WindowsTargetPlatformVersion>10.0</WindowsTargetPlatformVersion>".to_string());
    lines.push("  </PropertyGroup>".to_string());
    lines.push(
        "  <Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.Default.props\" />".to_string(),
    );

    for config in CONFIGURATIONS {
        let debug = config == "Debug";
        lines.push(format!(
            "  <PropertyGroup Condition=\"{}\" Label=\"Configuration\">",
            condition(config)
        ));
        lines.push("    <ConfigurationType>Utility</ConfigurationType>".to_string());
        lines.push(format!("    <UseDebugLibraries>{}</UseDebugLibraries>", debug));
        lines.push("    <PlatformToolset>v143</PlatformToolset>".to_string());
        if !debug {
            lines.push("    <WholeProgramOptimization>true</WholeProgramOptimization>".to_string());
        }
        lines.push("    <CharacterSet>Unicode</CharacterSet>".to_string());
        lines.push("  </PropertyGroup>".to_string());
    }

    lines.push("  <Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.props\" />".to_string());
    lines.push("  <ImportGroup Label=\"ExtensionSettings\">".to_string());
    lines.push("  </ImportGroup>".to_string());
    lines.push("  <ImportGroup Label=\"Shared\">".to_string());
    lines.push("  </ImportGroup>".to_string());
    for config in CONFIGURATIONS {
        lines.push(format!(
            "  <ImportGroup Label=\"PropertySheets\" Condition=\"{}\">",
            condition(config)
        ));
        lines.push(
            "    <Import Project=\"$(UserRootDir)\\Microsoft.Cpp.$(Platform).user.props\" \
             Condition=\"exists('$(UserRootDir)\\Microsoft.Cpp.$(Platform).user.props')\" \
             Label=\"LocalAppDataPlatform\" />"
                .to_string(),
        );
        lines.push("  </ImportGroup>".to_string());
    }
    lines.push("  <PropertyGroup Label=\"UserMacros\" />".to_string());

    let include_path: String = project
        .include_dirs
        .iter()
        .map(|dir| format!("$(ProjectDir){};", to_backslashes(&relative_to(dir, &project_dir))))
        .collect();
    for config in CONFIGURATIONS {
        lines.push(format!("  <PropertyGroup Condition=\"{}\">", condition(config)));
        lines.push(format!("    <LinkIncremental>{}</LinkIncremental>", config == "Debug"));
        lines.push("    <IntDir>$(Configuration)\\$(ProjectName)\\</IntDir>".to_string());
        lines.push(
            "    <OutDir>$(SolutionDir)Build\\$(Platform)\\$(Configuration)\\Output\\</OutDir>"
                .to_string(),
        );
        lines.push(format!(
            "    <IncludePath>{}$(IncludePath)</IncludePath>",
            xml_escape(&include_path)
        ));
        lines.push("  </PropertyGroup>".to_string());
    }

    let command = xml_escape(&build_command(project, settings, &project_dir));
    for config in CONFIGURATIONS {
        lines.push(format!("  <ItemDefinitionGroup Condition=\"{}\">", condition(config)));
        lines.push("    <PreBuildEvent>".to_string());
        lines.push(format!("      <Command>{}</Command>", command));
        lines.push(format!(
            "      <Message>Building {} with svcbuild</Message>",
            xml_escape(&project.name)
        ));
        lines.push("    </PreBuildEvent>".to_string());
        lines.push("  </ItemDefinitionGroup>".to_string());
    }

    let entries: Vec<_> = items(project).collect();
    if !entries.is_empty() {
        lines.push("  <ItemGroup>".to_string());
        for (_, entry) in &entries {
            lines.push(format!("    <None Include=\"{}\" />", item_path(entry, &project_dir)));
        }
        lines.push("  </ItemGroup>".to_string());
    }

    lines.push("  <Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.targets\" />".to_string());
    lines.push("  <ImportGroup Label=\"ExtensionTargets\">".to_string());
    lines.push("  </ImportGroup>".to_string());
    lines.push("</Project>".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn render_filters(project: &ProjectDescriptor, settings: &EmitSettings) -> String {
    let project_dir = settings.project_dir(project);
    let mut lines: Vec<String> = vec![
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>".to_string(),
        format!("<Project ToolsVersion=\"4.0\" xmlns=\"{}\">", MSBUILD_NS),
        "  <ItemGroup>".to_string(),
    ];
    for filter in &FILTERS {
        lines.push(format!("    <Filter Include=\"{}\">", filter.group));
        lines.push(format!("      <UniqueIdentifier>{}</UniqueIdentifier>", filter.guid));
        if let Some(extensions) = filter.extensions {
            lines.push(format!("      <Extensions>{}</Extensions>", extensions));
        }
        lines.push("    </Filter>".to_string());
    }
    lines.push("  </ItemGroup>".to_string());

    let entries: Vec<_> = items(project).collect();
    if !entries.is_empty() {
        lines.push("  <ItemGroup>".to_string());
        for (group, entry) in &entries {
            lines.push(format!("    <None Include=\"{}\">", item_path(entry, &project_dir)));
            lines.push(format!("      <Filter>{}</Filter>", group));
            lines.push("    </None>".to_string());
        }
        lines.push("  </ItemGroup>".to_string());
    }
    lines.push("</Project>".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub struct VcxprojEmitter;

impl Emitter for VcxprojEmitter {
    fn name(&self) -> &'static str {
        "vcxproj"
    }

    fn generate(&self, projects: &[ProjectDescriptor], settings: &EmitSettings) -> EmitResult {
        let mut result = EmitResult::default();
        for project in projects.iter().filter(|p| !p.kind.is_managed()) {
            let path = project_file(settings, project);
            let mut filters = path.clone().into_os_string();
            filters.push(".filters");

            result.write(&project.name, path, &render_project(project, settings));
            result.write(&project.name, PathBuf::from(filters), &render_filters(project, settings));
        }
        result
    }
}
