//! New service scaffolding for `svcbuild generate`
//!
//! Creates the canonical `Sources/Configs/Protos/Meta` layout with a stub entry point,
//! a JSON config, a proto3 file and literal-dialect descriptors. Nothing is compiled.

use ignore::WalkBuilder;
use serde_json::json;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::meta::literal::render_descriptor;
use crate::model::UnitSpec;

pub const BASE_PORT: u16 = 50051;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("Invalid unit name '{0}': use letters, digits and '_', starting with a letter")]
    InvalidName(String),

    #[error("Refusing to overwrite existing unit directory {0}")]
    AlreadyExists(PathBuf),

    #[error("No free port at or above {0}")]
    NoFreePort(u16),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ScaffoldRequest {
    pub name: String,
    pub port: Option<u16>,
    /// Directory the unit directory is created in
    pub parent_dir: PathBuf,
    /// Trees scanned for `*Config.json` files when no port is given
    pub port_search_roots: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Scaffold {
    pub unit_dir: PathBuf,
    pub port: u16,
    pub files: Vec<PathBuf>,
}

pub fn validate_name(name: &str) -> Result<(), ScaffoldError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ScaffoldError::InvalidName(name.to_string()))
    }
}

/// Every `listen_port` declared by a `*Config.json` below `roots`.
pub fn used_ports(roots: &[PathBuf]) -> BTreeSet<u16> {
    let mut ports = BTreeSet::new();
    for root in roots {
        let configs = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(false)
            .build()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter(|e| e.file_name().to_string_lossy().ends_with("Config.json"));

        for entry in configs {
            let Ok(text) = std::fs::read_to_string(entry.path()) else {
                continue;
            };
            let port = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("listen_port").and_then(|p| p.as_u64()))
                .and_then(|p| u16::try_from(p).ok());
            match port {
                Some(port) => {
                    ports.insert(port);
                }
                None => {
                    debug!(path = %entry.path().display(), "Config without a usable listen_port")
                }
            }
        }
    }
    ports
}

/// Lowest port at or above [`BASE_PORT`] not in `used`.
pub fn next_free_port(used: &BTreeSet<u16>) -> Result<u16, ScaffoldError> {
    (BASE_PORT..=u16::MAX)
        .find(|p| !used.contains(p))
        .ok_or(ScaffoldError::NoFreePort(BASE_PORT))
}

pub fn descriptor_spec(name: &str) -> UnitSpec {
    let lower = name.to_lowercase();
    UnitSpec {
        name: name.to_string(),
        sources: vec![format!("../Sources/{}Main.cpp", name)],
        include_dirs: vec!["../Sources".to_string()],
        proto_files: vec![format!("../Protos/{}.proto", lower)],
        config_files: vec![format!("../Configs/{}Config.json", name)],
        dependencies: vec!["protobuf".to_string()],
        output: Some(format!("{}Main", name)),
        ..UnitSpec::default()
    }
}

fn main_source(name: &str) -> String {
    format!(
        "#include <iostream>\n\nint main() {{\n    std::cout << \"{} started\" << std::endl;\n    return 0;\n}}\n",
        name
    )
}

fn config_json(name: &str, port: u16) -> String {
    let value = json!({
        "service_name": name,
        "listen_port": port,
        "log_level": "info",
    });
    let mut text = serde_json::to_string_pretty(&value).unwrap_or_default();
    text.push('\n');
    text
}

fn proto(name: &str) -> String {
    format!(
        "syntax = \"proto3\";\n\npackage {lower};\n\n\
         message {name}InitRequest {{\n    string service_name = 1;\n}}\n\n\
         message {name}InitResponse {{\n    bool success = 1;\n    string message = 2;\n}}\n",
        lower = name.to_lowercase(),
        name = name
    )
}

fn docker_descriptor(name: &str, port: u16) -> String {
    format!(
        "DockerMeta = {{\n    \"base_image\": \"ubuntu:22.04\",\n    \"copy_files\": [\n        \"../Sources/{name}Main\",\n        \"../Configs/{name}Config.json\"\n    ],\n    \"expose_ports\": [{port}],\n    \"entrypoint\": [\"./{name}Main\", \"--config\", \"{name}Config.json\"]\n}}\n",
        name = name,
        port = port
    )
}

fn kubernetes_descriptor(name: &str, port: u16) -> String {
    format!(
        "K8SMeta = {{\n    \"deployment_name\": \"{lower}-service\",\n    \"replicas\": 2,\n    \"container_port\": {port},\n    \"env\": {{\n        \"CONFIG_PATH\": \"/app/{name}Config.json\"\n    }}\n}}\n",
        lower = name.to_lowercase(),
        name = name,
        port = port
    )
}

/// Lays out a new unit. Fails without touching disk if the unit directory exists.
pub fn generate(request: &ScaffoldRequest) -> Result<Scaffold, ScaffoldError> {
    let name = request.name.as_str();
    validate_name(name)?;

    let unit_dir = request.parent_dir.join(name);
    if unit_dir.exists() {
        return Err(ScaffoldError::AlreadyExists(unit_dir));
    }

    let port = match request.port {
        Some(port) => port,
        None => next_free_port(&used_ports(&request.port_search_roots))?,
    };

    let lower = name.to_lowercase();
    let files: Vec<(PathBuf, String)> = vec![
        (unit_dir.join(format!("Sources/{}Main.cpp", name)), main_source(name)),
        (unit_dir.join(format!("Configs/{}Config.json", name)), config_json(name, port)),
        (unit_dir.join(format!("Protos/{}.proto", lower)), proto(name)),
        (
            unit_dir.join(format!("Meta/{}.Build.py", name)),
            render_descriptor("ServiceMeta", &descriptor_spec(name)),
        ),
        (unit_dir.join(format!("Meta/{}.Docker.py", name)), docker_descriptor(name, port)),
        (
            unit_dir.join(format!("Meta/{}.Kubernetes.py", name)),
            kubernetes_descriptor(name, port),
        ),
    ];

    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ScaffoldError::Io { path, source }
    };
    for dir in ["Sources", "Configs", "Protos", "Meta"] {
        let dir = unit_dir.join(dir);
        std::fs::create_dir_all(&dir).map_err(io(&dir))?;
    }
    for (path, content) in &files {
        std::fs::write(path, content).map_err(io(path))?;
    }

    info!(unit = name, port, dir = %unit_dir.display(), "Scaffolded unit");
    Ok(Scaffold {
        unit_dir,
        port,
        files: files.into_iter().map(|(path, _)| path).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::RealFileSystem;
    use crate::meta::{parse_descriptor, DialectTag};
    use tempfile::TempDir;

    fn request(parent: &Path, name: &str, port: Option<u16>) -> ScaffoldRequest {
        ScaffoldRequest {
            name: name.to_string(),
            port,
            parent_dir: parent.to_path_buf(),
            port_search_roots: vec![parent.to_path_buf()],
        }
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("PlayerService").is_ok());
        assert!(validate_name("Svc_2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("2Fast").is_err());
        assert!(validate_name("bad-name").is_err());
        assert!(validate_name("../escape").is_err());
    }

    #[test]
    fn test_next_free_port_skips_used() {
        let used: BTreeSet<u16> = [50051, 50052, 50054].into_iter().collect();
        assert_eq!(next_free_port(&used).unwrap(), 50053);
        assert_eq!(next_free_port(&BTreeSet::new()).unwrap(), BASE_PORT);
    }

    #[test]
    fn test_generates_full_layout() {
        let temp = TempDir::new().unwrap();
        let scaffold = generate(&request(temp.path(), "Chat", Some(6000))).unwrap();

        assert_eq!(scaffold.port, 6000);
        assert_eq!(scaffold.files.len(), 6);
        let dir = temp.path().join("Chat");
        assert!(dir.join("Sources/ChatMain.cpp").is_file());
        assert!(dir.join("Protos/chat.proto").is_file());
        assert!(dir.join("Meta/Chat.Docker.py").is_file());
        assert!(dir.join("Meta/Chat.Kubernetes.py").is_file());

        let text = std::fs::read_to_string(dir.join("Configs/ChatConfig.json")).unwrap();
        let config: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(config["service_name"], "Chat");
        assert_eq!(config["listen_port"], 6000);
        assert_eq!(config["log_level"], "info");

        let proto = std::fs::read_to_string(dir.join("Protos/chat.proto")).unwrap();
        assert!(proto.contains("package chat;"));
        assert!(proto.contains("message ChatInitResponse {"));
    }

    #[test]
    fn test_descriptor_parses_back() {
        let temp = TempDir::new().unwrap();
        generate(&request(temp.path(), "Chat", Some(6000))).unwrap();

        let path = temp.path().join("Chat/Meta/Chat.Build.py");
        let spec = parse_descriptor(&RealFileSystem::new(), &path, DialectTag::Literal).unwrap();
        assert_eq!(spec, descriptor_spec("Chat"));
    }

    #[test]
    fn test_port_follows_existing_configs() {
        let temp = TempDir::new().unwrap();
        generate(&request(temp.path(), "First", None)).unwrap();
        let second = generate(&request(temp.path(), "Second", None)).unwrap();
        assert_eq!(second.port, BASE_PORT + 1);
    }

    #[test]
    fn test_used_ports_skips_unusable_configs() {
        let temp = TempDir::new().unwrap();
        let configs = temp.path().join("Svc/Configs");
        std::fs::create_dir_all(&configs).unwrap();
        std::fs::write(configs.join("GoodConfig.json"), r#"{"listen_port": 50060}"#).unwrap();
        std::fs::write(configs.join("BrokenConfig.json"), "{ not json").unwrap();
        std::fs::write(configs.join("HugeConfig.json"), r#"{"listen_port": 70000}"#).unwrap();
        std::fs::write(configs.join("NoPortConfig.json"), r#"{"service_name": "Svc"}"#).unwrap();

        let ports = used_ports(&[temp.path().to_path_buf()]);
        assert_eq!(ports.into_iter().collect::<Vec<_>>(), vec![50060]);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("Chat/Sources")).unwrap();
        std::fs::write(temp.path().join("Chat/Sources/keep.cpp"), "// mine").unwrap();

        let err = generate(&request(temp.path(), "Chat", Some(1))).unwrap_err();
        assert!(matches!(err, ScaffoldError::AlreadyExists(_)));
        assert_eq!(
            std::fs::read_to_string(temp.path().join("Chat/Sources/keep.cpp")).unwrap(),
            "// mine"
        );
        assert!(!temp.path().join("Chat/Meta").exists());
    }
}
