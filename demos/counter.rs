use std::time::Duration;

use typed_actor::{ActorConfig, Effect, System, SystemConfig};

#[derive(Debug)]
enum Counter {
	Increment,
	Report,
	Stop,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt::init();

	let system = System::new(SystemConfig::named("counter-demo"))?;

	let counter = system.actor_of_with(ActorConfig::named("counter"), |_| {
		let mut count = 0u64;
		move |msg: Counter| -> Effect<Counter> {
			match msg {
				Counter::Increment => {
					count += 1;
					Effect::Stay
				}
				Counter::Report => {
					println!("Count: {count}");
					Effect::Stay
				}
				Counter::Stop => Effect::Die,
			}
		}
	});

	let senders: Vec<_> = (0..10)
		.map(|_| {
			let counter = counter.clone();
			tokio::spawn(async move {
				for _ in 0..100 {
					counter.tell(Counter::Increment);
				}
			})
		})
		.collect();

	for sender in senders {
		sender.await?;
	}

	counter.tell(Counter::Report).tell(Counter::Stop).tell(Counter::Report);

	tokio::time::sleep(Duration::from_millis(100)).await;
	print!("{}", system.report());

	Ok(())
}
