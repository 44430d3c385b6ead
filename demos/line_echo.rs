use std::sync::Arc;

use tokio::net::TcpListener;
use typed_actor::framing::{Frame, LineDecoder, StreamSink, StreamSource};
use typed_actor::{ActorConfig, Address, Behavior, Effect, System, SystemConfig};

const ADDR: &str = "127.0.0.1:4444";

#[derive(Debug)]
enum Session {
	Attach(Address<Frame>),
	LineRead(String),
}

/// Buffers lines until the connection's decoder is known.
struct Detached {
	backlog: Vec<String>,
}

struct Attached {
	connection: Address<Frame>,
}

impl Attached {
	fn echo(&self, line: String) {
		self.connection.tell(Frame::WriteLine(format!("echo: {line}")));
	}
}

impl Behavior<Session> for Detached {
	fn receive(&mut self, msg: Session) -> anyhow::Result<Effect<Session>> {
		match msg {
			Session::Attach(connection) => {
				let attached = Attached { connection };
				for line in self.backlog.drain(..) {
					attached.echo(line);
				}
				Ok(Effect::become_to(attached))
			}
			Session::LineRead(line) => {
				self.backlog.push(line);
				Ok(Effect::Stay)
			}
		}
	}
}

impl Behavior<Session> for Attached {
	fn receive(&mut self, msg: Session) -> anyhow::Result<Effect<Session>> {
		match msg {
			Session::Attach(_) => anyhow::bail!("Session attached twice"),
			Session::LineRead(line) if line == "quit" => {
				self.connection.tell(Frame::WriteLine("bye".into()));
				Ok(Effect::Die)
			}
			Session::LineRead(line) => {
				tracing::info!(%line, "Echoing");
				self.echo(line);
				Ok(Effect::Stay)
			}
		}
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt::init();

	let system = System::new(SystemConfig::named("line-echo"))?;
	let listener = TcpListener::bind(ADDR).await?;
	tracing::info!("Listening on {ADDR}");

	loop {
		let (stream, peer) = listener.accept().await?;
		tracing::info!(%peer, "Connection accepted");

		let (reader, writer) = stream.into_split();
		let session: Address<Session> = system.actor_of_with(ActorConfig::named(format!("session-{peer}")), |_| Detached {
			backlog: Vec::new(),
		});

		let connection = LineDecoder::spawn(
			&system,
			session.clone(),
			Session::LineRead,
			Arc::new(StreamSource::new(reader)),
			Arc::new(StreamSink::new(writer)),
		);
		session.tell(Session::Attach(connection));
	}
}
