//! Clean command implementation.
//!
//! Lists the components of every hosted docker repository, applies the
//! retention policy and deletes the selected versions one after the other.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};
use tracing::{info, warn};

use nexus_cleaner_client::{Component, ConfigFile, NexusClient, NexusConfig, DEFAULT_CONFIG_FILE};
use nexus_cleaner_core::{ImageVersion, RetentionPlan, RetentionPolicy, MIN_KEEP_VERSIONS};

use super::report::{OutputFormat, RepositoryReport, Reporter, RunReport};

/// Arguments for the clean command.
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Number of newest versions to keep per image
    #[arg(short, long, default_value_t = MIN_KEEP_VERSIONS)]
    pub count: usize,

    /// Delete only versions older than this many days
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Restrict cleanup to these image names (exact match)
    #[arg(short, long, num_args = 1..)]
    pub names: Vec<String>,

    /// Print every version of every image with its keep/delete decision
    #[arg(long = "full_info", alias = "full-info")]
    pub full_info: bool,

    /// Test run: report what would be deleted without deleting anything
    #[arg(long)]
    pub test: bool,

    /// Path to the configuration file (nexus_url, login, password)
    #[arg(long, env = "NEXUS_CLEANER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Restrict cleanup to these hosted docker repositories
    #[arg(short, long = "repository", num_args = 1..)]
    pub repositories: Vec<String>,

    /// What to delete for each selected version
    #[arg(long, value_enum, default_value_t = DeleteTarget::Asset)]
    pub delete_target: DeleteTarget,

    /// Request timeout in seconds
    #[arg(long, default_value = "60")]
    pub timeout: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl CleanArgs {
    /// Builds the retention policy described by the flags.
    pub fn policy(&self) -> RetentionPolicy {
        let policy = RetentionPolicy::new()
            .with_keep_last(self.count)
            .with_names(self.names.iter().cloned());

        match self.days {
            Some(days) => policy.with_older_than_days(days),
            None => policy,
        }
    }
}

/// Nexus object removed for a selected version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DeleteTarget {
    /// The newest asset of the version (its manifest).
    #[default]
    Asset,
    /// The whole component, with all of its assets.
    Component,
}

/// Executes the clean command.
///
/// # Errors
///
/// Returns an error if:
/// - The policy is invalid
/// - The configuration file is missing or incomplete
/// - Nexus cannot be reached or rejects the credentials
/// - A deletion fails (including a version that was already deleted)
pub async fn execute(args: CleanArgs) -> Result<()> {
    let policy = args.policy();
    policy.validate()?;

    let config = load_config(&args)?;
    let reporter = Reporter::new(args.format, args.full_info);
    reporter.header(&config.url, &policy, args.test);

    let client = NexusClient::new(config).context("Failed to create Nexus client")?;

    let repositories = select_repositories(&client, &args.repositories).await?;
    if repositories.is_empty() {
        warn!("No hosted docker repositories found");
    }

    let now = Utc::now();
    let mut report = RunReport::new(policy, args.test);

    for repository in repositories {
        let components = client
            .list_components(&repository)
            .await
            .with_context(|| format!("Unable to fetch components of {repository}"))?;
        let listed = components.len();

        let plan = report.policy.plan(image_versions(components), now);
        info!(
            repository = %repository,
            components = listed,
            images = plan.images().len(),
            delete = plan.deletion_count(),
            "Planned cleanup"
        );
        reporter.repository(&repository, &plan);

        let deleted = execute_plan(&client, &plan, args.delete_target, args.test, reporter).await?;

        report.repositories.push(RepositoryReport {
            repository,
            plan,
            deleted,
        });
    }

    reporter.finish(&report)
}

/// Turns listed components into image versions. Components without a dated
/// asset cannot be ordered and are left alone.
fn image_versions(components: Vec<Component>) -> Vec<ImageVersion> {
    components
        .into_iter()
        .filter_map(|component| {
            let id = component.id.clone();
            let version = component.into_image_version();
            if version.is_none() {
                warn!(component = %id, "Skipping component without dated assets");
            }
            version
        })
        .collect()
}

/// Loads the configuration file and applies command-line overrides.
fn load_config(args: &CleanArgs) -> Result<NexusConfig> {
    let config = ConfigFile::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?
        .into_config()
        .with_timeout(Duration::from_secs(args.timeout));

    Ok(config)
}

/// Returns the repositories to clean: the requested ones, or every hosted
/// docker repository.
async fn select_repositories(client: &NexusClient, requested: &[String]) -> Result<Vec<String>> {
    let available = client
        .docker_repositories()
        .await
        .context("Failed to list repositories")?;

    if requested.is_empty() {
        return Ok(available);
    }

    for name in requested {
        if !available.contains(name) {
            anyhow::bail!("{name} is not a hosted docker repository");
        }
    }

    Ok(requested.to_vec())
}

/// Deletes every version selected by the plan, in order. Returns the number
/// of versions deleted (or that would be deleted in a test run).
async fn execute_plan(
    client: &NexusClient,
    plan: &RetentionPlan,
    target: DeleteTarget,
    dry_run: bool,
    reporter: Reporter,
) -> Result<usize> {
    let mut deleted = 0;

    for version in plan.deletions() {
        reporter.deleting(version)?;

        if dry_run {
            reporter.deleted("TEST DONE");
        } else {
            delete_version(client, version, target)
                .await
                .with_context(|| format!("Failed to delete {}", version.reference()))?;
            reporter.deleted("OK");
        }

        info!(
            image = %version.reference(),
            asset = %version.asset_id,
            component = %version.component_id,
            dry_run,
            "Deleted image version"
        );
        deleted += 1;
    }

    Ok(deleted)
}

async fn delete_version(
    client: &NexusClient,
    version: &ImageVersion,
    target: DeleteTarget,
) -> Result<(), nexus_cleaner_client::ClientError> {
    match target {
        DeleteTarget::Asset => client.delete_asset(&version.asset_id).await,
        DeleteTarget::Component => client.delete_component(&version.component_id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Cli;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use clap::Parser;
    use mockito::{Matcher, Mock, Server};
    use nexus_cleaner_client::NexusAuth;
    use std::io::Write as _;

    fn parse(args: &[&str]) -> CleanArgs {
        let argv = std::iter::once("nexus-cleaner").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().clean
    }

    fn quiet() -> Reporter {
        Reporter::new(OutputFormat::Json, false)
    }

    fn client(server: &Server) -> NexusClient {
        let config = NexusConfig::new(server.url()).with_auth(NexusAuth::basic("user", "pass"));
        NexusClient::new(config).unwrap()
    }

    /// Plan for `total` daily versions of "api" with the given keep floor.
    fn plan(total: i64, keep_last: usize) -> RetentionPlan {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let versions = (0..total).map(|i| {
            ImageVersion::new(
                "api",
                format!("1.0.{i}"),
                base + ChronoDuration::days(i),
                format!("asset-{i}"),
                format!("component-{i}"),
            )
        });
        RetentionPolicy::new()
            .with_keep_last(keep_last)
            .plan(versions, base + ChronoDuration::days(total))
    }

    /// Search result entry dated 2024-01-`day`.
    fn component_json(id: &str, name: &str, version: &str, day: u32) -> String {
        format!(
            r#"{{"id": "{id}", "repository": "docker-hosted", "format": "docker", "name": "{name}", "version": "{version}",
                "assets": [{{"id": "{id}-m", "path": "v2/{name}/manifests/{version}", "lastModified": "2024-01-{day:02}T00:00:00.000+00:00"}}]}}"#
        )
    }

    fn config_file(server: &Server) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nexus_url={}", server.url()).unwrap();
        writeln!(file, "login=cleaner").unwrap();
        writeln!(file, "password=secret").unwrap();
        file
    }

    /// Serves one hosted docker repository whose search spans two pages:
    /// twelve "api" versions (api-0 oldest), twelve "web" versions and an
    /// "api" component without dated assets.
    async fn serve_listing(server: &mut Server) -> Vec<Mock> {
        let repositories = server
            .mock("GET", "/service/rest/v1/repositories")
            .with_status(200)
            .with_body(
                r#"[
                    {"name": "docker-hosted", "format": "docker", "type": "hosted"},
                    {"name": "docker-proxy", "format": "docker", "type": "proxy"}
                ]"#,
            )
            .expect(1)
            .create_async()
            .await;

        let first_items: Vec<String> = (0..6)
            .map(|i| component_json(&format!("api-{i}"), "api", &format!("1.0.{i}"), i + 1))
            .chain((0..12).map(|i| component_json(&format!("web-{i}"), "web", &format!("2.0.{i}"), i + 1)))
            .collect();
        let first = server
            .mock("GET", "/service/rest/v1/search")
            .match_query(Matcher::Exact("repository=docker-hosted".to_string()))
            .with_status(200)
            .with_body(format!(
                r#"{{"items": [{}], "continuationToken": "page-2"}}"#,
                first_items.join(",")
            ))
            .expect(1)
            .create_async()
            .await;

        let second_items: Vec<String> = (6..12)
            .map(|i| component_json(&format!("api-{i}"), "api", &format!("1.0.{i}"), i + 1))
            .chain(std::iter::once(
                r#"{"id": "api-undated", "repository": "docker-hosted", "format": "docker", "name": "api", "version": "0.0.1", "assets": []}"#
                    .to_string(),
            ))
            .collect();
        let second = server
            .mock("GET", "/service/rest/v1/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("repository".to_string(), "docker-hosted".to_string()),
                Matcher::UrlEncoded("continuationToken".to_string(), "page-2".to_string()),
            ]))
            .with_status(200)
            .with_body(format!(
                r#"{{"items": [{}], "continuationToken": null}}"#,
                second_items.join(",")
            ))
            .expect(1)
            .create_async()
            .await;

        vec![repositories, first, second]
    }

    // =========================================================================
    // Argument parsing
    // =========================================================================

    #[test]
    fn test_defaults_keep_minimum() {
        let args = parse(&[]);
        assert_eq!(args.count, MIN_KEEP_VERSIONS);
        assert!(args.days.is_none());
        assert!(args.names.is_empty());
        assert!(!args.full_info);
        assert!(!args.test);
        assert_eq!(args.delete_target, DeleteTarget::Asset);
        assert_eq!(args.policy(), RetentionPolicy::new());
    }

    #[test]
    fn test_count_flag() {
        let args = parse(&["-c", "20"]);
        assert_eq!(args.policy().keep_last, 20);
    }

    #[test]
    fn test_days_and_names() {
        let args = parse(&["-d", "5", "--full_info", "--names", "image1", "image2"]);
        let policy = args.policy();
        assert_eq!(policy.older_than_days, Some(5));
        assert_eq!(policy.names, vec!["image1", "image2"]);
        assert!(args.full_info);
    }

    #[test]
    fn test_full_info_alias() {
        assert!(parse(&["--full-info"]).full_info);
    }

    #[test]
    fn test_delete_target_component() {
        let args = parse(&["--delete-target", "component"]);
        assert_eq!(args.delete_target, DeleteTarget::Component);
    }

    #[test]
    fn test_count_below_minimum_rejected() {
        let args = parse(&["-c", "5"]);
        assert!(args.policy().validate().is_err());
    }

    #[test]
    fn test_load_config_applies_timeout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nexus_url=https://nexus.example.com").unwrap();
        writeln!(file, "login=cleaner").unwrap();
        writeln!(file, "password=secret").unwrap();

        let path = file.path().to_str().unwrap();
        let args = parse(&["--config", path, "--timeout", "7"]);
        let config = load_config(&args).unwrap();

        assert_eq!(config.url, "https://nexus.example.com");
        assert_eq!(config.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.conf");
        let args = parse(&["--config", path.to_str().unwrap()]);
        assert!(load_config(&args).is_err());
    }

    // =========================================================================
    // Execution
    // =========================================================================

    #[test]
    fn test_image_versions_skip_undated_components() {
        let components: Vec<Component> = serde_json::from_str(&format!(
            r#"[{}, {{"id": "bare", "name": "api", "version": "0.0.1", "assets": []}}]"#,
            component_json("api-0", "api", "1.0.0", 1)
        ))
        .unwrap();

        let versions = image_versions(components);

        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].component_id, "api-0");
        assert_eq!(versions[0].asset_id, "api-0-m");
    }

    #[tokio::test]
    async fn test_execute_deletes_only_selected_image() {
        let mut server = Server::new_async().await;
        let listing = serve_listing(&mut server).await;

        let mut selected = Vec::new();
        for i in 0..2 {
            selected.push(
                server
                    .mock("DELETE", format!("/service/rest/v1/assets/api-{i}-m").as_str())
                    .with_status(204)
                    .expect(1)
                    .create_async()
                    .await,
            );
        }
        let kept = server
            .mock("DELETE", Matcher::Regex("/assets/api-([2-9]|1[01])-m$".to_string()))
            .expect(0)
            .create_async()
            .await;
        let other_image = server
            .mock("DELETE", Matcher::Regex("/assets/web-".to_string()))
            .expect(0)
            .create_async()
            .await;
        let components = server
            .mock("DELETE", Matcher::Regex("/components/".to_string()))
            .expect(0)
            .create_async()
            .await;

        let config = config_file(&server);
        let path = config.path().to_str().unwrap();
        execute(parse(&["--config", path, "-c", "10", "--names", "api", "-f", "json"]))
            .await
            .unwrap();

        for mock in listing.iter().chain(&selected) {
            mock.assert_async().await;
        }
        kept.assert_async().await;
        other_image.assert_async().await;
        components.assert_async().await;
    }

    #[tokio::test]
    async fn test_execute_without_selection_deletes_nothing() {
        let mut server = Server::new_async().await;
        let listing = serve_listing(&mut server).await;
        let deletes = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let config = config_file(&server);
        let path = config.path().to_str().unwrap();
        execute(parse(&["--config", path, "-c", "20", "-f", "json"]))
            .await
            .unwrap();

        for mock in &listing {
            mock.assert_async().await;
        }
        deletes.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_plan_deletes_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let deleted = execute_plan(&client(&server), &plan(3, 10), DeleteTarget::Asset, false, quiet())
            .await
            .unwrap();

        assert_eq!(deleted, 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_test_run_deletes_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let deleted = execute_plan(&client(&server), &plan(5, 2), DeleteTarget::Asset, true, quiet())
            .await
            .unwrap();

        assert_eq!(deleted, 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deletes_selected_assets() {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();
        for i in 0..3 {
            mocks.push(
                server
                    .mock("DELETE", format!("/service/rest/v1/assets/asset-{i}").as_str())
                    .with_status(204)
                    .expect(1)
                    .create_async()
                    .await,
            );
        }
        let kept = server
            .mock("DELETE", Matcher::Regex("asset-[34]$".to_string()))
            .expect(0)
            .create_async()
            .await;

        let deleted = execute_plan(&client(&server), &plan(5, 2), DeleteTarget::Asset, false, quiet())
            .await
            .unwrap();

        assert_eq!(deleted, 3);
        for mock in mocks {
            mock.assert_async().await;
        }
        kept.assert_async().await;
    }

    #[tokio::test]
    async fn test_deletes_components() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/service/rest/v1/components/component-0")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let deleted = execute_plan(&client(&server), &plan(3, 2), DeleteTarget::Component, false, quiet())
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_already_deleted_aborts_run() {
        let mut server = Server::new_async().await;
        let _gone = server
            .mock("DELETE", "/service/rest/v1/assets/asset-0")
            .with_status(404)
            .create_async()
            .await;
        let next = server
            .mock("DELETE", "/service/rest/v1/assets/asset-1")
            .expect(0)
            .create_async()
            .await;

        let err = execute_plan(&client(&server), &plan(4, 2), DeleteTarget::Asset, false, quiet())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to delete api:1.0.0"));
        next.assert_async().await;
    }

    #[tokio::test]
    async fn test_select_repositories() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/service/rest/v1/repositories")
            .with_status(200)
            .with_body(
                r#"[
                    {"name": "docker-hosted", "format": "docker", "type": "hosted"},
                    {"name": "docker-proxy", "format": "docker", "type": "proxy"}
                ]"#,
            )
            .expect_at_least(1)
            .create_async()
            .await;
        let client = client(&server);

        let all = select_repositories(&client, &[]).await.unwrap();
        assert_eq!(all, vec!["docker-hosted"]);

        let chosen = select_repositories(&client, &["docker-hosted".to_string()])
            .await
            .unwrap();
        assert_eq!(chosen, vec!["docker-hosted"]);

        let err = select_repositories(&client, &["docker-proxy".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a hosted docker repository"));
    }
}
