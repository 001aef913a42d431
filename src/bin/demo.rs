//! Host demo: two active objects wired together through the time-event
//! wheel and publish/subscribe, run under the cooperative (QV)
//! scheduler. Exercises components A–I end to end without any real
//! board — a stand-in for a target's `main()`, in the same spirit as a
//! firmware's event loop that pushes synthetic ticks when it isn't
//! actually running on hardware.

use aoframe::ao::ActiveObject;
use aoframe::config::FrameworkConfig;
use aoframe::event::{Event, EventPayload, Signal};
use aoframe::hsm::Outcome;
use aoframe::pubsub::SubscriberTable;
use aoframe::sched::{qv, AoRegistry};
use aoframe::time::{TimeEvent, TimeWheel};
use aoframe::trace::{EmitOutcome, TraceChannel};
use aoframe::Bsp;

/// Delivered by the time wheel directly to `counter`, once per tick.
const SIG_TICK: Signal = Signal::user(10);
/// Fanned out by publish/subscribe to every subscriber, every tick.
const SIG_HEARTBEAT: Signal = Signal::user(11);

const RECORD_COUNTER_SAMPLE: u8 = 1;

fn blinker(ctx: &mut bool, e: &Event) -> Outcome<bool> {
    match e.signal {
        Signal::ENTRY | Signal::EXIT | Signal::INIT => Outcome::Handled,
        Signal::EMPTY => Outcome::Ignored,
        SIG_HEARTBEAT => {
            *ctx = !*ctx;
            log::info!("blinker: {}", if *ctx { "ON" } else { "OFF" });
            Outcome::Handled
        }
        _ => Outcome::Handled,
    }
}

fn counter(ctx: &mut u32, e: &Event) -> Outcome<u32> {
    match e.signal {
        Signal::ENTRY | Signal::EXIT | Signal::INIT => Outcome::Handled,
        Signal::EMPTY => Outcome::Ignored,
        SIG_TICK | SIG_HEARTBEAT => {
            *ctx += 1;
            Outcome::Handled
        }
        _ => Outcome::Handled,
    }
}

struct DemoBsp {
    idle_calls: u32,
}

impl Bsp for DemoBsp {
    fn on_startup(&mut self) {
        log::info!("demo board started");
    }

    fn on_idle(&mut self) {
        self.idle_calls += 1;
    }

    fn on_assert(&mut self, module: &'static str, line: u32) -> ! {
        panic!("aoframe fatal fault at {module}:{line}");
    }

    fn qs_on_flush(&mut self, bytes: &[u8]) {
        log::debug!("trace: {} framed byte(s) {:02x?}", bytes.len(), bytes);
    }
}

fn main() {
    env_logger::init();
    log::info!("aoframe demo starting");

    let config = FrameworkConfig::default();
    let mut bsp = DemoBsp { idle_calls: 0 };
    let mut pools = aoframe::init(&mut bsp, &config);

    let mut blinker_ao: ActiveObject<bool, 4> = ActiveObject::new(1, false, blinker);
    let mut counter_ao: ActiveObject<u32, 4> = ActiveObject::new(2, 0, counter);
    blinker_ao.start();
    counter_ao.start();

    let mut registry = AoRegistry::new();
    // Safety: both AOs outlive every scheduling pass below — they are
    // local to this function and dropped only after the loop ends.
    unsafe {
        registry.register(&mut blinker_ao).expect("priority 1 is free");
        registry.register(&mut counter_ao).expect("priority 2 is free");
    }

    let mut subs: SubscriberTable<4> = SubscriberTable::new();
    subs.subscribe(blinker_ao.priority(), SIG_HEARTBEAT).unwrap();
    subs.subscribe(counter_ao.priority(), SIG_HEARTBEAT).unwrap();

    let tick_event = pools.new_static(SIG_TICK, EventPayload::Empty).expect("static table has room");
    let heartbeat_event = pools.new_static(SIG_HEARTBEAT, EventPayload::Empty).expect("static table has room");

    let mut wheel: TimeWheel<4> = TimeWheel::new();
    let handle = wheel.add(TimeEvent::new(counter_ao.priority(), tick_event)).unwrap();
    wheel.arm(handle, 1, 1);

    let mut trace: TraceChannel<256> = TraceChannel::new();

    for tick in 1u32..=10 {
        // Safety: every priority referenced by `wheel`/`subs` above is
        // registered in `registry`.
        unsafe {
            wheel.tick(&mut registry);
            subs.publish(SIG_HEARTBEAT, heartbeat_event, &mut registry, &mut pools);
        }
        while unsafe { qv::step(&mut registry, &mut pools, &mut bsp) } {}

        let sample = counter_ao.context().to_le_bytes();
        match trace.record_event(counter_ao.priority(), RECORD_COUNTER_SAMPLE, tick, &sample) {
            EmitOutcome::Emitted => {}
            other => log::warn!("trace dropped a record: {other:?}"),
        }
        let mut out = [0u8; 64];
        let n = trace.drain(&mut out);
        if n > 0 {
            bsp.qs_on_flush(&out[..n]);
        }
    }

    log::info!(
        "demo finished: blinker={}, counter={}, idle_calls={}",
        blinker_ao.context(),
        counter_ao.context(),
        bsp.idle_calls
    );
}
