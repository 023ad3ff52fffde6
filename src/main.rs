//! Tron vanity address worker CLI
//!
//! Usage:
//!   tron_vanity server                                   # consume jobs from Redis
//!   tron_vanity build TTTCqtavqZiKEMVYgEQSN2b91h88888888 1 3 1
//!   tron_vanity build TTTCqtavqZiKEMVYgEQSN2b91h66666666 1 4 5 --engine cpu

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tron_vanity::config::{BuildArgs, Command, Config, ServerArgs};
use tron_vanity::heartbeat::{Heartbeat, HEARTBEAT_INTERVAL, HEARTBEAT_TTL};
use tron_vanity::oneshot::run_build;
use tron_vanity::queue::{QueueService, RedisQueue};
use tron_vanity::upload::Uploader;
use tron_vanity::{Classifier, Dispatcher, ResultPublisher};

fn main() {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    let outcome = match config.command {
        Command::Server(args) => server(args),
        Command::Build(args) => build(args),
    };

    if let Err(e) = outcome {
        tracing::error!("{:#}", e);
        process::exit(1);
    }
}

fn server(args: ServerArgs) -> Result<()> {
    let consumer = RedisQueue::new(args.redis_settings()).context("invalid Redis settings")?;
    consumer.ping().with_context(|| {
        format!(
            "cannot reach Redis at {}; check the address and allow-list",
            args.redis_addr
        )
    })?;
    tracing::info!(addr = %args.redis_addr, "connected to Redis");

    let publisher_queue: Arc<dyn QueueService> = Arc::new(consumer.fork());
    let heartbeat_queue: Arc<dyn QueueService> = Arc::new(consumer.fork());
    let consumer: Arc<dyn QueueService> = Arc::new(consumer);

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    })
    .context("failed to install Ctrl-C handler")?;

    let heartbeat = Heartbeat::spawn(
        heartbeat_queue,
        args.heartbeat_key.clone(),
        HEARTBEAT_INTERVAL,
        HEARTBEAT_TTL,
    );

    let dispatcher = Dispatcher::new(
        consumer,
        ResultPublisher::new(publisher_queue, args.queue_out.clone()),
        Classifier::new(args.template_list.clone()),
        args.engine.build_engine(),
        args.dispatcher_settings(),
    );
    dispatcher.run(&shutdown);

    heartbeat.stop();
    Ok(())
}

fn build(args: BuildArgs) -> Result<()> {
    let engine = args.engine.build_engine();
    let spec = args.pattern_spec();
    let uploader = args.post_url.as_deref().map(Uploader::new);

    tracing::info!(
        template = %args.template,
        prefix_count = args.prefix_count,
        suffix_count = args.suffix_count,
        repeat = args.quit_count,
        engine = engine.name(),
        "generating"
    );

    let found = run_build(engine.as_ref(), &spec, args.quit_count, uploader.as_ref())
        .context("address generation failed")?;

    for result in &found {
        println!("{} {}", result.private_key, result.address);
    }
    Ok(())
}
