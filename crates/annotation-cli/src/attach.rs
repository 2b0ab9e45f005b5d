//! `annotation attach` subcommand

use anyhow::{anyhow, bail, Context, Result};
use annotation_client::Credential;
use annotation_service::{AttachOptions, AttachOutcome};
use clap::{Args, ValueEnum};
use std::io::BufRead;
use std::time::Duration;
use tracing::info;

use crate::config::AppConfig;

/// How the result is printed on standard output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable lines
    Text,
    /// A single JSON object
    Json,
}

/// Arguments of `annotation attach`
#[derive(Args, Debug)]
pub struct AttachArgs {
    /// Username to use for authentication with the registry
    #[arg(long, env = "ANNOTATION_USERNAME")]
    pub username: String,

    /// Password to use for authentication with the registry
    #[arg(
        long,
        env = "ANNOTATION_PASSWORD",
        hide_env_values = true,
        required_unless_present = "password_stdin"
    )]
    pub password: Option<String>,

    /// Read the password from standard input
    ///
    /// Takes precedence over --password and ANNOTATION_PASSWORD.
    #[arg(long)]
    pub password_stdin: bool,

    /// Registry host, e.g. myregistry.example.com
    #[arg(long)]
    pub registry: String,

    /// Repository holding the subject artifact
    #[arg(long)]
    pub subject_repository: String,

    /// Tag or digest of the subject artifact
    #[arg(long)]
    pub subject_tag_or_digest: String,

    /// Annotation to attach as "key: value" (repeatable)
    #[arg(long = "annotation", required = true, value_name = "KEY: VALUE")]
    pub annotations: Vec<String>,

    /// Talk plain HTTP to the registry
    #[arg(long)]
    pub plain_http: bool,

    /// Deadline for the whole run in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// Run the attach pipeline and print its outcome
pub async fn execute(args: AttachArgs, config: &AppConfig) -> Result<()> {
    let output = args.output;
    let outcome = run_attach(args, config, std::io::stdin().lock()).await?;

    println!("{}", render(&outcome, output)?);
    Ok(())
}

/// Run the attach pipeline under the end-to-end deadline
///
/// `stdin` is only read when `--password-stdin` is set.
pub async fn run_attach(
    args: AttachArgs,
    config: &AppConfig,
    stdin: impl BufRead,
) -> Result<AttachOutcome> {
    let password = match (args.password_stdin, args.password) {
        (true, _) => read_password(stdin)?,
        (false, Some(password)) => password,
        (false, None) => bail!("a password is required: use --password or --password-stdin"),
    };

    let client_config = config
        .client_config()
        .plain_http(args.plain_http || config.registry.plain_http);
    let deadline = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.deadline());

    let options = AttachOptions {
        registry: args.registry,
        subject_repository: args.subject_repository,
        subject_tag_or_digest: args.subject_tag_or_digest,
        annotations: args.annotations,
        credential: Credential::new(args.username, password),
    };

    info!(
        registry = %options.registry,
        repository = %options.subject_repository,
        subject = %options.subject_tag_or_digest,
        "Attaching annotations"
    );

    tokio::time::timeout(
        deadline,
        annotation_service::attach(&options, client_config),
    )
    .await
    .map_err(|_| anyhow!("attach did not finish within the {}s deadline", deadline.as_secs()))?
    .context("Failed to attach annotations")
}

/// Read a password from the first line of `reader`
fn read_password(mut reader: impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("empty password on stdin");
    }
    Ok(password.to_string())
}

fn render(outcome: &AttachOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "Pushed {}\nDigest: {}",
            outcome.reference, outcome.manifest.digest
        )),
        OutputFormat::Json => {
            serde_json::to_string_pretty(outcome).context("Failed to serialize outcome")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotation_core::manifest::media_type;
    use annotation_core::{Descriptor, Digest};
    use std::io::Cursor;
    use wiremock::matchers::{header, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SUBJECT: &[u8] = br#"{"schemaVersion":2,"config":{},"layers":[]}"#;
    // base64("ci-bot:s3cret")
    const BASIC_AUTH: &str = "Basic Y2ktYm90OnMzY3JldA==";

    fn attach_args(server: &MockServer) -> AttachArgs {
        AttachArgs {
            username: "ci-bot".to_string(),
            password: Some("s3cret".to_string()),
            password_stdin: false,
            registry: server.address().to_string(),
            subject_repository: "team/app".to_string(),
            subject_tag_or_digest: "v1".to_string(),
            annotations: vec!["team: platform".to_string()],
            plain_http: true,
            timeout: None,
            output: OutputFormat::Text,
        }
    }

    fn subject_response() -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("Docker-Content-Digest", Digest::from_bytes(SUBJECT).to_string().as_str())
            .set_body_raw(SUBJECT, media_type::OCI_MANIFEST)
    }

    async fn accept_push(server: &MockServer) {
        Mock::given(method("PUT"))
            .and(path_regex(r"^/v2/team/app/manifests/sha256:[0-9a-f]{64}$"))
            .respond_with(ResponseTemplate::new(201))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_password_from_stdin_reaches_registry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/team/app/manifests/v1"))
            .and(header("authorization", BASIC_AUTH))
            .respond_with(subject_response())
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).insert_header("WWW-Authenticate", r#"Basic realm="test""#),
            )
            .with_priority(10)
            .mount(&server)
            .await;
        accept_push(&server).await;

        let mut args = attach_args(&server);
        args.password = Some("from-environment".to_string());
        args.password_stdin = true;

        let outcome = run_attach(args, &AppConfig::default(), Cursor::new("s3cret\n"))
            .await
            .unwrap();
        assert_eq!(outcome.subject.digest, Digest::from_bytes(SUBJECT));
    }

    #[tokio::test]
    async fn test_plain_http_from_config() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/team/app/manifests/v1"))
            .respond_with(subject_response())
            .mount(&server)
            .await;
        accept_push(&server).await;

        let mut args = attach_args(&server);
        args.plain_http = false;
        let mut config = AppConfig::default();
        config.registry.plain_http = true;

        let outcome = run_attach(args, &config, Cursor::new("")).await.unwrap();
        assert!(outcome.reference.starts_with(&server.address().to_string()));
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(subject_response().set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let mut args = attach_args(&server);
        args.timeout = Some(1);

        let err = run_attach(args, &AppConfig::default(), Cursor::new(""))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1s deadline"), "{}", err);
    }

    #[tokio::test]
    async fn test_missing_password() {
        let server = MockServer::start().await;
        let mut args = attach_args(&server);
        args.password = None;

        let err = run_attach(args, &AppConfig::default(), Cursor::new(""))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("password is required"));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    fn outcome() -> AttachOutcome {
        let manifest = Descriptor::for_content(media_type::ARTIFACT_MANIFEST, b"{}");
        AttachOutcome {
            reference: format!("registry.example.com/team/app@{}", manifest.digest),
            subject: Descriptor::for_content(media_type::OCI_MANIFEST, b"{\"layers\":[]}"),
            manifest,
        }
    }

    #[test]
    fn test_read_password_strips_newline() {
        assert_eq!(read_password(Cursor::new("s3cret\n")).unwrap(), "s3cret");
        assert_eq!(read_password(Cursor::new("s3cret\r\n")).unwrap(), "s3cret");
        assert_eq!(read_password(Cursor::new(" padded ")).unwrap(), " padded ");
    }

    #[test]
    fn test_read_password_rejects_empty() {
        assert!(read_password(Cursor::new("")).is_err());
        assert!(read_password(Cursor::new("\n")).is_err());
    }

    #[test]
    fn test_render_text() {
        let outcome = outcome();
        let text = render(&outcome, OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            format!(
                "Pushed {}\nDigest: {}",
                outcome.reference, outcome.manifest.digest
            )
        );
    }

    #[test]
    fn test_render_json() {
        let outcome = outcome();
        let json = render(&outcome, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["reference"], outcome.reference);
        assert_eq!(value["digest"], outcome.manifest.digest.to_string());
        assert_eq!(value["mediaType"], media_type::ARTIFACT_MANIFEST);
        assert_eq!(value["size"], 2);
        assert_eq!(value["subject"]["mediaType"], media_type::OCI_MANIFEST);
    }
}
