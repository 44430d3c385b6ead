use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use typed_actor::{
	ActorConfig, ActorStatus, Address, Behavior, Effect, MailboxConfig, Message, Overflow, System,
	SystemConfig, SystemError, TellError, fallible,
};

fn system() -> System {
	System::new(SystemConfig::named("test")).expect("inside a runtime")
}

// Actor that forwards everything it receives to a channel.
fn collector<T: Message>(system: &System) -> (Address<T>, mpsc::UnboundedReceiver<T>) {
	let (tx, rx) = mpsc::unbounded_channel();
	let addr = system.actor_of(move |_| {
		move |msg: T| -> Effect<T> {
			let _ = tx.send(msg);
			Effect::Stay
		}
	});
	(addr, rx)
}

async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
	tokio::time::timeout(Duration::from_secs(2), rx.recv())
		.await
		.expect("Timed out waiting for a message")
		.expect("Channel closed")
}

async fn eventually(mut check: impl FnMut() -> bool) {
	for _ in 0..200 {
		if check() {
			return;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	panic!("Condition not reached in time");
}

#[tokio::test]
async fn single_sender_order_is_preserved() {
	let system = system();
	let (addr, mut rx) = collector::<u32>(&system);

	for n in 0..1000 {
		addr.tell(n);
	}

	for n in 0..1000 {
		assert_eq!(next(&mut rx).await, n);
	}
}

#[tokio::test]
async fn tell_chains() {
	let system = system();
	let (addr, mut rx) = collector::<&'static str>(&system);

	addr.tell("a").tell("b").tell("c");

	assert_eq!(next(&mut rx).await, "a");
	assert_eq!(next(&mut rx).await, "b");
	assert_eq!(next(&mut rx).await, "c");
}

#[tokio::test]
async fn stay_keeps_behavior_state() {
	let system = system();
	let (tx, mut rx) = mpsc::unbounded_channel();

	let counter = system.actor_of(move |_| {
		let mut count = 0u32;
		move |_: ()| -> Effect<()> {
			count += 1;
			let _ = tx.send(count);
			Effect::Stay
		}
	});

	counter.tell(()).tell(()).tell(());

	assert_eq!(next(&mut rx).await, 1);
	assert_eq!(next(&mut rx).await, 2);
	assert_eq!(next(&mut rx).await, 3);
}

#[derive(Debug)]
enum Switch {
	Toggle,
	Probe,
}

struct Off(mpsc::UnboundedSender<&'static str>);
struct On(mpsc::UnboundedSender<&'static str>);

impl Behavior<Switch> for Off {
	fn receive(&mut self, msg: Switch) -> anyhow::Result<Effect<Switch>> {
		Ok(match msg {
			Switch::Toggle => Effect::become_to(On(self.0.clone())),
			Switch::Probe => {
				let _ = self.0.send("off");
				Effect::Stay
			}
		})
	}
}

impl Behavior<Switch> for On {
	fn receive(&mut self, msg: Switch) -> anyhow::Result<Effect<Switch>> {
		Ok(match msg {
			Switch::Toggle => Effect::become_to(Off(self.0.clone())),
			Switch::Probe => {
				let _ = self.0.send("on");
				Effect::Stay
			}
		})
	}
}

#[tokio::test]
async fn become_applies_to_next_message() {
	let system = system();
	let (tx, mut rx) = mpsc::unbounded_channel();
	let switch: Address<Switch> = system.actor_of(move |_| Off(tx));

	switch
		.tell(Switch::Probe)
		.tell(Switch::Toggle)
		.tell(Switch::Probe)
		.tell(Switch::Toggle)
		.tell(Switch::Probe);

	assert_eq!(next(&mut rx).await, "off");
	assert_eq!(next(&mut rx).await, "on");
	assert_eq!(next(&mut rx).await, "off");
}

#[tokio::test]
async fn factory_receives_own_address() {
	let system = system();
	let (tx, mut rx) = mpsc::unbounded_channel();

	let countdown = system.actor_of(move |this: Address<u32>| {
		move |n: u32| -> Effect<u32> {
			let _ = tx.send(n);
			if n > 0 {
				this.tell(n - 1);
			}
			Effect::Stay
		}
	});

	countdown.tell(3);

	for expected in [3, 2, 1, 0] {
		assert_eq!(next(&mut rx).await, expected);
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_senders_deliver_everything() {
	let system = system();
	let (tx, mut rx) = mpsc::unbounded_channel();

	let counter: Address<u32> = system.actor_of(move |_| {
		let mut count = 0u32;
		move |_: u32| -> Effect<u32> {
			count += 1;
			let _ = tx.send(count);
			Effect::Stay
		}
	});

	let senders: Vec<_> = (0..10)
		.map(|sender| {
			let counter = counter.clone();
			tokio::spawn(async move {
				for n in 0..100 {
					counter.tell(sender * 100 + n);
				}
			})
		})
		.collect();

	for sender in senders {
		sender.await.expect("Sender should finish");
	}

	let mut last = 0;
	for _ in 0..1000 {
		last = next(&mut rx).await;
	}
	assert_eq!(last, 1000);
	assert_eq!(counter.stats().processed(), 1000);
}

#[tokio::test]
async fn dead_actor_absorbs_messages() {
	let system = system();
	let (tx, mut rx) = mpsc::unbounded_channel();

	let mortal = system.actor_of(move |_| {
		move |msg: &'static str| -> Effect<&'static str> {
			let _ = tx.send(msg);
			if msg == "die" { Effect::Die } else { Effect::Stay }
		}
	});

	mortal.tell("hello").tell("die");
	assert_eq!(next(&mut rx).await, "hello");
	assert_eq!(next(&mut rx).await, "die");

	for _ in 0..5 {
		mortal.tell("ignored");
	}

	eventually(|| mortal.stats().dead_letters() == 5).await;
	assert_eq!(mortal.status(), ActorStatus::Dead);
	assert_eq!(mortal.stats().processed(), 2);
	assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn failing_behavior_halts_only_that_actor() {
	let system = system();
	let (tx, mut rx) = mpsc::unbounded_channel();

	let fragile: Address<i32> = system.actor_of(move |_| {
		fallible(move |n: i32| -> anyhow::Result<Effect<i32>> {
			anyhow::ensure!(n >= 0, "negative input {n}");
			let _ = tx.send(n);
			Ok(Effect::Stay)
		})
	});
	let (bystander, mut bystander_rx) = collector::<i32>(&system);

	fragile.tell(1).tell(-1);
	assert_eq!(next(&mut rx).await, 1);
	eventually(|| fragile.status() == ActorStatus::Halted).await;

	fragile.tell(2).tell(3);
	assert_eq!(fragile.mailbox_len(), 2);

	bystander.tell(7);
	assert_eq!(next(&mut bystander_rx).await, 7);
	assert_eq!(bystander.status(), ActorStatus::Running);
}

#[tokio::test]
async fn panicking_behavior_halts_the_actor() {
	let system = system();

	let fragile: Address<u8> = system.actor_of(|_| {
		|n: u8| -> Effect<u8> {
			if n == 0 {
				panic!("cannot handle zero");
			}
			Effect::Stay
		}
	});

	fragile.tell(0);
	eventually(|| fragile.status() == ActorStatus::Halted).await;

	fragile.tell(1);
	assert_eq!(fragile.mailbox_len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn bounded_reject_hands_message_back() {
	let system = system();
	let (tx, mut rx) = mpsc::unbounded_channel();
	let config = ActorConfig::named("bounded").with_mailbox(MailboxConfig::bounded(2, Overflow::Reject));

	let addr: Address<u32> = system.actor_of_with(config, move |_| {
		move |n: u32| -> Effect<u32> {
			let _ = tx.send(n);
			Effect::Stay
		}
	});

	// current_thread: the actor cannot run before we await
	assert!(addr.try_tell(1).is_ok());
	assert!(addr.try_tell(2).is_ok());
	match addr.try_tell(3) {
		Err(TellError::Full(msg)) => assert_eq!(msg, 3),
		Ok(()) => panic!("Mailbox should be full"),
	}
	addr.tell(4);
	assert_eq!(addr.stats().dropped(), 1);

	assert_eq!(next(&mut rx).await, 1);
	assert_eq!(next(&mut rx).await, 2);
	tokio::task::yield_now().await;
	assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "current_thread")]
async fn bounded_drop_oldest_keeps_newest() {
	let system = System::new(
		SystemConfig::named("drop-oldest").with_mailbox(MailboxConfig::bounded(2, Overflow::DropOldest)),
	)
	.unwrap();
	let (addr, mut rx) = collector::<u32>(&system);

	addr.tell(1).tell(2).tell(3);
	assert_eq!(addr.stats().dropped(), 1);

	assert_eq!(next(&mut rx).await, 2);
	assert_eq!(next(&mut rx).await, 3);
}

// Records the field names of every event.
struct FieldNames(Arc<Mutex<Vec<Vec<&'static str>>>>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FieldNames {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
		let names = event.fields().map(|field| field.name()).collect();
		self.0.lock().unwrap().push(names);
	}
}

#[tokio::test(flavor = "current_thread")]
async fn overflow_warning_carries_the_dropped_message() {
	let events = Arc::new(Mutex::new(Vec::new()));
	let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(FieldNames(events.clone())));

	let system = system();
	let config = ActorConfig::default().with_mailbox(MailboxConfig::bounded(1, Overflow::DropOldest));
	let addr: Address<u32> = system.actor_of_with(config, |_| |_: u32| -> Effect<u32> { Effect::Stay });

	// current_thread: both tells land before the actor runs
	addr.tell(1).tell(2);

	let events = events.lock().unwrap();
	let warning = events
		.iter()
		.find(|names| names.contains(&"msg"))
		.expect("overflow is logged");
	assert_eq!(warning.iter().filter(|name| **name == "message").count(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn send_waits_for_room() {
	let system = system();
	let (tx, mut rx) = mpsc::unbounded_channel();
	let config = ActorConfig::default().with_mailbox(MailboxConfig::bounded(1, Overflow::Reject));

	let addr: Address<u32> = system.actor_of_with(config, move |_| {
		move |n: u32| -> Effect<u32> {
			let _ = tx.send(n);
			Effect::Stay
		}
	});

	addr.tell(1);
	addr.send(2).await;
	addr.send(3).await;

	assert_eq!(next(&mut rx).await, 1);
	assert_eq!(next(&mut rx).await, 2);
	assert_eq!(next(&mut rx).await, 3);
	assert_eq!(addr.stats().dropped(), 0);
}

#[tokio::test]
async fn shutdown_stops_every_unit() {
	let system = system();
	let (addr, mut rx) = collector::<u32>(&system);

	addr.tell(1);
	assert_eq!(next(&mut rx).await, 1);

	system.shutdown();
	assert!(system.is_shut_down());
	assert_eq!(addr.status(), ActorStatus::Stopped);

	addr.tell(2);
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert!(rx.try_recv().is_err());

	let late: Address<u32> = system.actor_of(|_| |_: u32| -> Effect<u32> { Effect::Stay });
	assert_eq!(late.status(), ActorStatus::Stopped);
}

#[tokio::test]
async fn independent_systems_do_not_interfere() {
	let first = system();
	let second = system();
	let (a, mut a_rx) = collector::<u32>(&first);
	let (b, mut b_rx) = collector::<u32>(&second);

	first.shutdown();

	b.tell(1);
	assert_eq!(next(&mut b_rx).await, 1);
	a.tell(1);
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert!(a_rx.try_recv().is_err());
	assert_eq!(second.actor_count(), 1);
}

#[tokio::test]
async fn report_lists_actors() {
	let system = system();
	let config = ActorConfig::named("echo");
	let echo: Address<u8> = system.actor_of_with(config, |_| |_: u8| -> Effect<u8> { Effect::Stay });

	echo.tell(1).tell(2);
	eventually(|| echo.stats().processed() == 2).await;

	let report = system.report();
	let row = report.get(echo.id()).expect("echo is registered");
	assert_eq!(row.processed, 2);
	assert_eq!(row.status, ActorStatus::Running);
	assert!(report.to_string().contains("echo#1"));
}

#[test]
fn system_needs_a_runtime() {
	let err = System::new(SystemConfig::default()).unwrap_err();
	assert!(matches!(err, SystemError::NoRuntime(_)));
}
