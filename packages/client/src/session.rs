//! One interactive chat session against the relay.

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use maeum_server::infrastructure::dto::{
    http::{
        AnonymousIdentityDto, EndSessionRequestDto, ErrorResponseDto, MatchRequestDto,
        MatchResponseDto, MatchStatus,
    },
    websocket::{ClientEvent, ServerEvent},
};
use reqwest::Url;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::{
    args::ClientArgs,
    command::{Command, HELP},
    error::ClientError,
    render::render,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// HTTP side of the relay API.
pub struct Api {
    http: reqwest::Client,
    base: Url,
}

impl Api {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "expected http or https, got {}",
                base.scheme()
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorResponseDto>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn anonymous_identity(&self) -> Result<AnonymousIdentityDto, ClientError> {
        let response = self
            .http
            .post(self.endpoint("/api/auth/anonymous")?)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn request_match(&self, user_id: &str) -> Result<MatchResponseDto, ClientError> {
        let response = self
            .http
            .post(self.endpoint("/api/chat/match")?)
            .json(&MatchRequestDto {
                user_id: user_id.to_string(),
            })
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn end_session(&self, session_id: &str, user_id: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.endpoint(&format!("/api/chat/{session_id}/end"))?)
            .json(&EndSessionRequestDto {
                user_id: user_id.to_string(),
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// `ws(s)://host/ws?user_id=..&display_name=..`
    pub fn websocket_url(&self, user_id: &str, display_name: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint("/ws")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::InvalidUrl(format!("cannot use scheme {scheme}")))?;
        url.query_pairs_mut()
            .append_pair("user_id", user_id)
            .append_pair("display_name", display_name);
        Ok(url)
    }
}

async fn send_event(sink: &mut WsSink, event: &ClientEvent) -> Result<(), ClientError> {
    let json = serde_json::to_string(event)?;
    sink.send(Message::text(json)).await?;
    Ok(())
}

/// Read prompt lines on a dedicated thread; rustyline blocks.
fn spawn_reader(tx: mpsc::UnboundedSender<String>) {
    std::thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                tracing::error!("Failed to open terminal input: {}", e);
                return;
            }
        };
        loop {
            match editor.readline("") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });
}

/// Connect, join a room and chat until the user quits or the server hangs up.
pub async fn run(args: ClientArgs) -> Result<(), ClientError> {
    let api = Api::new(&args.url)?;

    let (user_id, display_name) = match args.user_id {
        Some(user_id) => {
            let name = match args.name {
                Some(name) => name,
                None => api.anonymous_identity().await?.display_name,
            };
            (user_id, name)
        }
        None => {
            let identity = api.anonymous_identity().await?;
            (identity.user_id, args.name.unwrap_or(identity.display_name))
        }
    };
    tracing::debug!("Using identity {} ({})", user_id, display_name);

    let room_id = match args.room {
        Some(room) => room,
        None => {
            let matched = api.request_match(&user_id).await?;
            match matched.status {
                MatchStatus::Matched => println!("* 대화 상대를 찾았습니다."),
                MatchStatus::Waiting => println!("* 대화 상대를 찾는 중입니다..."),
            }
            matched.session.id
        }
    };

    let url = api.websocket_url(&user_id, &display_name)?;
    let (ws, _) = connect_async(url.as_str()).await?;
    tracing::info!("Connected to {}", url);
    println!("{display_name} 님, 환영합니다. /help 로 명령어를 볼 수 있어요.");

    let (mut sink, mut stream): (WsSink, SplitStream<WsStream>) = ws.split();
    send_event(
        &mut sink,
        &ClientEvent::JoinRoom {
            room_id: room_id.clone(),
            display_name: None,
        },
    )
    .await?;

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    spawn_reader(line_tx);

    loop {
        tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerEvent>(text.as_str()) {
                        Ok(event) => {
                            if let Some(line) = render(&event, &user_id) {
                                println!("{line}");
                            }
                        }
                        Err(e) => tracing::warn!("Unrecognized server event: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    println!("* 서버와의 연결이 끊어졌습니다.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
            line = line_rx.recv() => {
                let Some(line) = line else { break };
                match Command::parse(&line) {
                    Command::Say(content) => {
                        send_event(&mut sink, &ClientEvent::SendMessage {
                            room_id: room_id.clone(),
                            sender_id: Some(user_id.clone()),
                            content,
                        }).await?;
                    }
                    Command::Leave => {
                        send_event(&mut sink, &ClientEvent::LeaveRoom {
                            room_id: room_id.clone(),
                        }).await?;
                    }
                    Command::End => {
                        // The relay announces the end with a session_ended event
                        if let Err(e) = api.end_session(&room_id, &user_id).await {
                            println!("! {e}");
                        }
                    }
                    Command::Quit => break,
                    Command::Help => println!("{HELP}"),
                    Command::Unknown(cmd) => println!("! 알 수 없는 명령어: {cmd}"),
                    Command::Empty => {}
                }
            }
        }
    }

    if let Err(e) = sink.close().await {
        tracing::debug!("Close failed: {}", e);
    }
    Ok(())
}
