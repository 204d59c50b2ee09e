use crate::argparse::{Cli, Commands, ConfigArgs, SensorAction, SensorFields, Switch};
use anyhow::{anyhow, Context, Result};
use chrono::prelude::*;
use devpanel::device::{Reading, SensorTest};
use devpanel::session::Submission;
use devpanel::{HttpBackend, Queue, Session, Settings};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};

// Part of the binary crate only, the library never installs a subscriber
mod argparse;
mod logging;
mod render;

const DEFAULT_WIDTH: u16 = 80;

type DeviceSession = Session<HttpBackend>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = argparse::parse();

    let level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let _guards = logging::init(level, cli.console, Some(cli.log_file.as_path()));

    let settings = settings(&cli)?;
    info!("Using device at {}", settings.api_url);
    let queue = Arc::new(Queue::new());
    let backend = HttpBackend::new(settings.timeout).context("building HTTP client")?;

    let width = match cli.command {
        Commands::Shell { width, .. } => width,
        _ => DEFAULT_WIDTH,
    };
    let mut session = Session::new(&settings, backend, queue.clone(), width);

    match cli.command {
        Commands::Status => status(&session, &queue).await,
        Commands::Config(args) => config(&session, &queue, args).await,
        Commands::Maintenance { switch } => {
            session.loader().set_maintenance(switch == Switch::On).await;
            flush(&queue);
            Ok(())
        }
        Commands::Sensor { action } => sensor(&session, &queue, action).await,
        Commands::Monitor { .. } => monitor(&session, &queue).await,
        Commands::Shell { .. } => shell(&mut session, &queue).await,
    }
}

fn settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::from_env()?;
    if let Some(url) = &cli.api_url {
        settings = settings.with_api_url(url)?;
    }
    if let Some(secs) = cli.timeout {
        settings = settings.with_timeout(secs)?;
    }
    if let Some(consistency) = cli.consistency {
        settings.consistency = consistency;
    }
    match cli.command {
        Commands::Monitor {
            empty_replies: Some(empty_replies),
        }
        | Commands::Shell {
            empty_replies: Some(empty_replies),
            ..
        } => settings.empty_replies = empty_replies,
        _ => (),
    }
    Ok(settings)
}

/// Prints and forgets whatever notifications piled up
fn flush(queue: &Queue) {
    print!("{}", render::notifications(&queue.drain()));
}

async fn status(session: &DeviceSession, queue: &Queue) -> Result<()> {
    session.start().await;
    flush(queue);
    let loader = session.loader();
    println!("{}", render::telemetry(&loader.telemetry()));
    println!("{}", render::config(&loader.config()));
    print!("{}", render::sensors(&loader.config()));
    Ok(())
}

async fn config(session: &DeviceSession, queue: &Queue, args: ConfigArgs) -> Result<()> {
    let loader = session.loader();
    loader.fetch_config().await;
    flush(queue);
    let mut form = loader
        .config_form(&Local)
        .ok_or_else(|| anyhow!("device settings could not be loaded"))?;
    if let Some(name) = args.name {
        form.device_name = name;
    }
    if let Some(id) = args.id {
        form.device_id = id;
    }
    if let Some(ssid) = args.ssid {
        form.wifi_ssid = ssid;
    }
    if let Some(password) = args.password {
        form.wifi_password = password;
    }
    if let Some(interval) = args.interval {
        form.send_interval = interval;
    }
    if let (Some(date), Some(time)) = (args.first_send_date, args.first_send_time) {
        form.first_send_at_date = date;
        form.first_send_at_time = time;
    }
    let patch = form.submit(&Local)?;
    loader.update_config(&patch).await;
    flush(queue);
    Ok(())
}

async fn sensor(session: &DeviceSession, queue: &Queue, action: SensorAction) -> Result<()> {
    let loader = session.loader();
    match action {
        SensorAction::Add { name } => {
            loader.create_sensor(&name).await?;
        }
        SensorAction::Update { name, fields } => {
            loader.fetch_config().await;
            flush(queue);
            let mut sensor = loader
                .config()
                .sensor(&name)
                .cloned()
                .ok_or_else(|| anyhow!("no sensor named '{name}'"))?;
            apply(&mut sensor, fields)?;
            loader.update_sensor(&name, &sensor).await?;
        }
        SensorAction::Rename { name, new_name } => {
            loader.rename_sensor(&name, &new_name).await?;
        }
        SensorAction::Delete { name } => {
            loader.delete_sensor(&name).await?;
        }
        SensorAction::Test { name } => match loader.test_sensor(&name).await? {
            Some(SensorTest::Values { response }) => {
                for (reading, value) in response.iter() {
                    println!("{reading} = {value}");
                }
            }
            Some(SensorTest::Failed { error }) => println!("Test failed: {error}"),
            None => (),
        },
    }
    flush(queue);
    Ok(())
}

fn apply(sensor: &mut devpanel::device::Sdi12Sensor, fields: SensorFields) -> Result<()> {
    if let Some(address) = fields.address {
        sensor.address = address;
    }
    if let Some(bootup_time) = fields.bootup_time {
        sensor.bootup_time = bootup_time;
    }
    if let Some(record_interval) = fields.record_interval {
        sensor.record_interval = record_interval;
    }
    if let Some(enabled) = fields.enabled {
        sensor.enabled = enabled;
    }
    if let Some(count) = fields.readings {
        sensor.resize_readings(count)?;
    }
    if let Some(json) = fields.reading_json {
        let readings: Vec<Reading> =
            serde_json::from_str(&json).context("--reading-json is not a readings list")?;
        sensor.readings = readings;
    }
    Ok(())
}

fn report(submission: Submission) {
    match submission {
        Submission::Recorded(result) => println!("{result}"),
        Submission::Busy => println!("(still waiting for the previous reply, command ignored)"),
        Submission::Dropped | Submission::Failed(_) => (),
    }
}

/// Lines from stdin become monitor commands. Typing ahead while a reply is
/// pending is refused by the console itself.
async fn monitor(session: &DeviceSession, queue: &Queue) -> Result<()> {
    let console = session.console();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = FuturesUnordered::new();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = line.trim().to_string();
                if !command.is_empty() {
                    pending.push(console.submit(command));
                }
            }
            Some(submission) = pending.next(), if !pending.is_empty() => {
                report(submission);
                flush(queue);
            }
        }
    }
    while let Some(submission) = pending.next().await {
        report(submission);
    }
    flush(queue);
    Ok(())
}

fn page(session: &DeviceSession) -> String {
    let loader = session.loader();
    render::page(
        session.view(),
        loader.is_loaded(),
        &loader.telemetry(),
        &loader.config(),
        &session.console().history(),
    )
}

async fn shell(session: &mut DeviceSession, queue: &Queue) -> Result<()> {
    println!("{}", page(session));
    session.start().await;
    flush(queue);
    println!("{}", page(session));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        match word {
            "" => continue,
            "quit" | "exit" => break,
            "tab" => match rest.trim().parse::<usize>() {
                Ok(index) => {
                    session.view_mut().click(index);
                }
                Err(_) => println!("usage: tab N"),
            },
            "resize" => match rest.trim().parse::<u16>() {
                Ok(width) => session.view_mut().resize(width),
                Err(_) => println!("usage: resize WIDTH"),
            },
            "send" if !rest.trim().is_empty() => {
                report(session.console().submit(rest.trim()).await);
            }
            "reload" => {
                session.start().await;
            }
            _ => println!("commands: tab N, resize WIDTH, send CMD, reload, quit"),
        }
        flush(queue);
        println!("{}", page(session));
    }
    Ok(())
}
