use super::GENERATED_HEADER;
use crate::pipeline::error::GenerationError;
use crate::pipeline::phases::classify::ProjectProfile;
use crate::pipeline::phases::entrypoint::Entrypoint;
use crate::stack::BackingService;
use serde::Serialize;
use std::collections::BTreeMap;

const APP_SERVICE: &str = "app";

#[derive(Debug, Serialize)]
struct ComposeFile {
    services: BTreeMap<String, Service>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    volumes: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Default, Serialize)]
struct Service {
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<Build>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    environment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,
    restart: &'static str,
}

#[derive(Debug, Serialize)]
struct Build {
    context: String,
    dockerfile: String,
}

/// The `app` service plus one service per backing service
pub fn render(profile: &ProjectProfile, entrypoint: &Entrypoint) -> Result<String, GenerationError> {
    let mut services = BTreeMap::new();
    let mut volumes = BTreeMap::new();

    let mut app = Service {
        build: Some(Build {
            context: ".".to_string(),
            dockerfile: "Dockerfile".to_string(),
        }),
        ports: entrypoint.ports.iter().map(|p| format!("{}:{}", p, p)).collect(),
        restart: "unless-stopped",
        ..Default::default()
    };
    if let Some(port) = entrypoint.primary_port() {
        app.environment.insert("PORT".to_string(), port.to_string());
    }

    for service in &profile.backing_services {
        let (key, url) = connection_env(*service, &profile.backing_services);
        app.environment.insert(key.to_string(), url.to_string());
        app.depends_on.push(service.name().to_string());

        let mut backing = Service {
            image: Some(service.image().to_string()),
            environment: service
                .environment()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            restart: "unless-stopped",
            ..Default::default()
        };
        if let Some((volume, mount)) = service.volume() {
            backing.volumes.push(format!("{}:{}", volume, mount));
            volumes.insert(volume, BTreeMap::new());
        }
        services.insert(service.name().to_string(), backing);
    }
    services.insert(APP_SERVICE.to_string(), app);

    let yaml = serde_yaml::to_string(&ComposeFile { services, volumes })
        .map_err(|e| GenerationError::render("compose file", e))?;
    Ok(format!("{}\n{}", GENERATED_HEADER, yaml))
}

/// MySQL takes `DATABASE_URL` unless PostgreSQL already claims it
fn connection_env(
    service: BackingService,
    all: &[BackingService],
) -> (&'static str, &'static str) {
    let (key, url) = service.connection_env();
    if service == BackingService::Mysql && !all.contains(&BackingService::Postgres) {
        ("DATABASE_URL", url)
    } else {
        (key, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_env_precedence() {
        assert_eq!(
            connection_env(BackingService::Mysql, &[BackingService::Mysql]).0,
            "DATABASE_URL"
        );
        assert_eq!(
            connection_env(
                BackingService::Mysql,
                &[BackingService::Postgres, BackingService::Mysql]
            )
            .0,
            "MYSQL_URL"
        );
    }
}
