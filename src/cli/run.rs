use std::{
    error::Error,
    io::{self, BufRead},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Instant,
};

use ds4_driver::{
    config::{DeviceBackend, DeviceConfig, DriverConfig, StatusConfig},
    controller::{Controller, StatusPublisher},
    drivers::ds4::{
        device::{Device, DeviceError, FileDevice, HidrawDevice},
        driver::{Driver, DS4_NAME},
    },
    messages::{feedback::FeedbackRequest, status::Status},
    schedule::{driver::ScheduleDriver, timer::ScheduleTimer},
};
use tokio::{
    sync::mpsc::{self, Receiver, Sender},
    task::JoinHandle,
};

use super::Output;

/// Size of the message channels
const BUFFER_SIZE: usize = 64;

/// Run the configured schedule, publishing each sample as a status message.
/// With `with_device` the configured controller is opened too; its status is
/// published and feedback requests are read from stdin as JSON lines.
pub async fn handle_run(
    config: DriverConfig,
    with_device: bool,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let status_config = config.status();
    let schedule_config = config.schedule();
    let schedule = schedule_config.build()?;
    log::info!(
        "Running schedule with {} breakpoints ending at {}s",
        schedule.len(),
        schedule.end_time()
    );

    // Print every published message on stdout
    let (out_tx, out_rx) = mpsc::channel(BUFFER_SIZE);
    let printer = tokio::spawn(print_outputs(out_rx));

    let stop = Arc::new(AtomicBool::new(false));
    let device_task = match config.device.clone() {
        Some(device) if with_device => {
            let (feedback_tx, feedback_rx) = mpsc::channel(BUFFER_SIZE);
            read_feedback(feedback_tx);
            Some(spawn_device(
                device,
                status_config.clone(),
                feedback_rx,
                out_tx.clone(),
                stop.clone(),
            ))
        }
        Some(_) => None,
        None => {
            if with_device {
                log::warn!("No device configured");
            }
            None
        }
    };

    // Forward schedule samples to stdout
    let (status_tx, mut status_rx) = mpsc::channel::<Status>(BUFFER_SIZE);
    let out = out_tx.clone();
    tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            if out.send(Output::Status(status)).await.is_err() {
                break;
            }
        }
    });
    drop(out_tx);

    let driver = ScheduleDriver::with_tick(schedule, schedule_config.tick_duration());
    let (timer, client) = ScheduleTimer::new(driver);
    let publisher = StatusPublisher::new(&status_config, status_tx);
    let timer_task = tokio::spawn(timer.run(publisher));

    // Setup CTRL+C handler
    let should_stop = stop.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Unable to listen for CTRL+C: {e:?}");
            return;
        }
        log::info!("Shutting down");
        should_stop.store(true, Ordering::Relaxed);
        if let Err(e) = client.stop().await {
            log::debug!("Schedule already finished: {e}");
        }
    });

    let driver = timer_task.await?;
    log::info!("Schedule finished after {:?}", driver.last_elapsed());

    if let Some(task) = device_task {
        match task.await? {
            Ok(()) => log::info!("Controller session ended"),
            Err(e) => log::error!("Controller session failed: {e}"),
        }
    }

    printer.await?;
    Ok(())
}

async fn print_outputs(mut rx: Receiver<Output>) {
    while let Some(output) = rx.recv().await {
        if let Err(e) = output.print() {
            log::error!("Unable to serialize {output:?}: {e}");
        }
    }
}

/// Read feedback requests as JSON lines from stdin, either as a feedback
/// object or as a joypad feedback array. Runs on its own thread so a pending
/// read never holds up shutdown.
fn read_feedback(tx: Sender<FeedbackRequest>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::error!("Unable to read stdin: {e}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let request: FeedbackRequest = match serde_json::from_str(&line) {
                Ok(request) => request,
                Err(e) => {
                    log::warn!("Invalid feedback request: {e}");
                    continue;
                }
            };
            if tx.blocking_send(request).is_err() {
                break;
            }
        }
        log::debug!("Stopped reading feedback");
    });
}

/// Open the configured device and run the controller session on a blocking
/// thread
fn spawn_device(
    config: DeviceConfig,
    status: StatusConfig,
    feedback_rx: Receiver<FeedbackRequest>,
    out: Sender<Output>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<Result<(), DeviceError>> {
    tokio::task::spawn_blocking(move || {
        let name = config.name.clone().unwrap_or_else(|| DS4_NAME.to_string());
        match config.backend {
            DeviceBackend::Hidraw => {
                let device = HidrawDevice::new(config.path.as_str())?;
                let controller = Controller::new(Driver::new(device, name), &status);
                run_controller(controller, feedback_rx, out, stop)
            }
            DeviceBackend::File => {
                let device = FileDevice::open(config.path.as_str(), config.transport)?;
                let controller = Controller::new(Driver::new(device, name), &status);
                run_controller(controller, feedback_rx, out, stop)
            }
        }
    })
}

/// Poll the controller until it disconnects or a stop is requested,
/// publishing status, joy and battery messages and applying feedback.
pub fn run_controller<D: Device>(
    mut controller: Controller<D>,
    mut feedback_rx: Receiver<FeedbackRequest>,
    out: Sender<Output>,
    stop: Arc<AtomicBool>,
) -> Result<(), DeviceError> {
    log::info!("Started {}", controller.name());
    let mut stop_rumble_at: Option<Instant> = None;
    let mut last_battery = None;

    while !stop.load(Ordering::Relaxed) {
        // Apply any pending feedback requests
        while let Ok(request) = feedback_rx.try_recv() {
            if let Some(duration) = controller.handle_request(&request)? {
                stop_rumble_at = Instant::now().checked_add(duration);
            }
        }
        if stop_rumble_at.is_some_and(|deadline| Instant::now() >= deadline) {
            controller.stop_rumble()?;
            stop_rumble_at = None;
        }

        let status = match controller.poll_status() {
            Ok(status) => status,
            Err(DeviceError::Report(e)) => {
                log::warn!("Skipping input report: {e}");
                continue;
            }
            Err(DeviceError::Disconnected) => {
                log::info!("{} disconnected", controller.name());
                if let Err(e) = controller.close() {
                    log::debug!("Unable to reset disconnected controller: {e}");
                }
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut outputs = Vec::with_capacity(3);
        if let Some(joy) = controller.joy_if_changed(&status) {
            outputs.push(Output::Joy(joy));
        }
        let battery = status.to_battery_state();
        let battery_key = (battery.percentage, battery.power_supply_status);
        if last_battery != Some(battery_key) {
            last_battery = Some(battery_key);
            outputs.push(Output::Battery(battery));
        }
        outputs.push(Output::Status(status));

        for output in outputs {
            if out.blocking_send(output).is_err() {
                log::debug!("Output channel closed");
                return controller.close();
            }
        }
    }

    controller.close()
}
