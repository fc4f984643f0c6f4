//! Client-side commands driving a remote gateway
//!
//! Mints a signed token once per invocation and attaches it to every call
//! through a client interceptor; with TLS enabled in the config the client
//! also presents its certificate for mutual authentication.

use anyhow::{bail, Context, Result};
use boxgate_config::GatewayConfig;
use boxgate_server::proto::containers_client::ContainersClient;
use boxgate_server::proto::{
    self, CloseRequest, CreateRequest, InfoRequest, StartRequest, StopRequest, SuspendRequest,
};
use boxgate_server::{client_tls, TOKEN_METADATA_KEY};
use clap::Args;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::interceptor::InterceptedService;
use tonic::service::Interceptor;
use tonic::transport::Channel;
use tonic::{Request, Status};

/// Connection options shared by every client command
#[derive(Args)]
pub struct ClientOpts {
    /// Gateway address (host:port)
    #[arg(long, default_value = "127.0.0.1:4444")]
    pub addr: String,

    /// Token signing key; falls back to auth.sign_key from the config
    #[arg(long)]
    pub sign_key: Option<String>,

    /// Authorization key embedded in the token; falls back to auth.auth_key
    #[arg(long)]
    pub auth_key: Option<String>,
}

pub type Client = ContainersClient<InterceptedService<Channel, TokenInterceptor>>;

/// Attaches the signed token to every outgoing call
#[derive(Clone)]
pub struct TokenInterceptor {
    token: MetadataValue<Ascii>,
}

impl Interceptor for TokenInterceptor {
    fn call(&mut self, mut request: Request<()>) -> std::result::Result<Request<()>, Status> {
        request
            .metadata_mut()
            .insert(TOKEN_METADATA_KEY, self.token.clone());
        Ok(request)
    }
}

const TOKEN_TTL: Duration = Duration::from_secs(3600);

#[derive(Serialize)]
struct Claims {
    sub: String,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    ak: Option<String>,
}

fn mint_token(sign_key: &str, auth_key: Option<&str>) -> Result<String> {
    let exp = (SystemTime::now() + TOKEN_TTL)
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?
        .as_secs() as i64;

    let claims = Claims {
        sub: "boxgate-cli".to_string(),
        exp,
        ak: auth_key.map(String::from),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(sign_key.as_bytes()),
    )
    .context("could not sign token")
}

/// Dial the gateway with a freshly minted token attached to every call
pub async fn connect(opts: &ClientOpts, config: &GatewayConfig) -> Result<Client> {
    let sign_key = opts
        .sign_key
        .clone()
        .or_else(|| (!config.auth.sign_key.is_empty()).then(|| config.auth.sign_key.clone()))
        .context("a token signing key is required (--sign-key or auth.sign_key in the config)")?;
    let auth_key = opts
        .auth_key
        .clone()
        .or_else(|| (!config.auth.auth_key.is_empty()).then(|| config.auth.auth_key.clone()));

    let token = mint_token(&sign_key, auth_key.as_deref())?;
    let interceptor = TokenInterceptor {
        token: token.parse().context("token is not valid metadata")?,
    };

    let host = opts.addr.split(':').next().unwrap_or_default().to_string();
    let tls = client_tls(&config.tls, &host)?;
    let scheme = if tls.is_some() { "https" } else { "http" };

    let mut endpoint = Channel::from_shared(format!("{}://{}", scheme, opts.addr))
        .context("invalid gateway address")?;
    if let Some(tls) = tls {
        endpoint = endpoint.tls_config(tls)?;
    }

    let channel = endpoint
        .connect()
        .await
        .with_context(|| format!("could not reach the gateway at {}", opts.addr))?;

    Ok(ContainersClient::with_interceptor(channel, interceptor))
}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    client: &mut Client,
    image: String,
    memory_mb: u64,
    cpu: f64,
    env: Vec<String>,
    label: Vec<String>,
    bridge: bool,
    cmd: Vec<String>,
) -> Result<()> {
    let request = CreateRequest {
        image,
        env_vars: parse_pairs(&env, "--env")?,
        labels: parse_pairs(&label, "--label")?,
        resources: Some(proto::Resources { memory_mb, cpu }),
        cmd,
        use_bridge: bridge,
        ..Default::default()
    };

    let response = client.create(request).await?.into_inner();
    println!("{}", response.message);
    if let Some(container) = response.container {
        print_container(&container);
    }
    Ok(())
}

pub async fn start(client: &mut Client, id: String) -> Result<()> {
    let response = client.start(StartRequest { id }).await?.into_inner();
    println!("{}", response.message);
    Ok(())
}

pub async fn suspend(client: &mut Client, id: String) -> Result<()> {
    let response = client.suspend(SuspendRequest { id }).await?.into_inner();
    println!("{}", response.message);
    Ok(())
}

pub async fn stop(client: &mut Client, id: String) -> Result<()> {
    let response = client.stop(StopRequest { id }).await?.into_inner();
    println!("{}", response.message);
    Ok(())
}

pub async fn close(client: &mut Client, id: String) -> Result<()> {
    let response = client.close(CloseRequest { id }).await?.into_inner();
    println!("{}", response.message);
    Ok(())
}

pub async fn info(client: &mut Client, id: String) -> Result<()> {
    let response = client.info(InfoRequest { id }).await?.into_inner();
    match response.container {
        Some(container) => print_container(&container),
        None => println!("No container information returned"),
    }
    Ok(())
}

/// The original walkthrough: create a container, start it, close it
pub async fn demo(client: &mut Client, image: String) -> Result<()> {
    let created = client
        .create(CreateRequest {
            image,
            resources: Some(proto::Resources {
                memory_mb: 50,
                cpu: 1.0,
            }),
            use_bridge: true,
            ..Default::default()
        })
        .await?
        .into_inner();
    println!("{}", created.message);

    let id = created
        .container
        .map(|c| c.id)
        .context("create response carried no container")?;

    let started = client.start(StartRequest { id: id.clone() }).await?.into_inner();
    println!("{}", started.message);

    let closed = client.close(CloseRequest { id }).await?.into_inner();
    println!("{}", closed.message);

    Ok(())
}

fn parse_pairs(raw: &[String], flag: &str) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for entry in raw {
        match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                map.insert(key.to_string(), value.to_string());
            }
            _ => bail!("{} expects KEY=VALUE, got {:?}", flag, entry),
        }
    }
    Ok(map)
}

fn print_container(container: &proto::Container) {
    let state = proto::ContainerState::try_from(container.state)
        .unwrap_or(proto::ContainerState::Unspecified);
    println!("id:    {}", container.id);
    println!(
        "state: {}",
        state
            .as_str_name()
            .trim_start_matches("CONTAINER_STATE_")
            .to_lowercase()
    );
    println!("image: {}", container.image);
    println!("type:  {}", container.container_type);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let pairs = parse_pairs(
            &["FOO=bar".to_string(), "EMPTY=".to_string()],
            "--env",
        )
        .unwrap();
        assert_eq!(pairs.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(pairs.get("EMPTY").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_pairs_rejects_missing_separator() {
        assert!(parse_pairs(&["NOVALUE".to_string()], "--env").is_err());
        assert!(parse_pairs(&["=value".to_string()], "--label").is_err());
    }

    #[test]
    fn test_minted_token_verifies() {
        use boxgate_server::{Authenticator, TokenAuthenticator, TOKEN_METADATA_KEY};

        let token = mint_token("secret", Some("authz")).unwrap();
        let mut metadata = tonic::metadata::MetadataMap::new();
        metadata.insert(TOKEN_METADATA_KEY, token.parse().unwrap());

        let authenticator = TokenAuthenticator::new("secret", "authz");
        let identity = authenticator.authenticate(&metadata).unwrap();
        assert_eq!(identity.subject, "boxgate-cli");
    }
}
