use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::action::Action;
use crate::config::Config;
use crate::error::Result;
use crate::system::collector::Collector;
use crate::system::process::ProcessSnapshot;
use crate::system::snapshot::SystemSnapshot;
use crate::ui::theme::Theme;
use crate::ui::{self, Frame};
use crate::view::{Layout, TermSize, ViewState};

pub type SizeFn = Box<dyn Fn() -> TermSize + Send + Sync>;
pub type Screen = Box<dyn Write + Send>;

/// Whether the input loop keeps going after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// State read by every draw. Rows and system figures are replaced whole,
/// never edited in place.
struct Shared {
    view: ViewState,
    rows: Arc<[ProcessSnapshot]>,
    system: Arc<SystemSnapshot>,
}

/// Coordinates the refresh task and the input thread.
///
/// Lock order is collector then shared, or screen then shared. The shared
/// lock is never held while another lock is taken.
pub struct App {
    collector: Mutex<Collector>,
    shared: Mutex<Shared>,
    screen: Mutex<Screen>,
    size: SizeFn,
    theme: Theme,
    hint: String,
    auto_refresh: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl App {
    pub fn new(collector: Collector, config: &Config, screen: Screen, size: SizeFn) -> Self {
        App {
            collector: Mutex::new(collector),
            shared: Mutex::new(Shared {
                view: ViewState::new(config.columns(), config.sort_spec()),
                rows: Arc::from(Vec::new()),
                system: Arc::new(SystemSnapshot::default()),
            }),
            screen: Mutex::new(screen),
            size,
            theme: Theme::from_config(&config.colors),
            hint: config.footer.keybindings.clone(),
            auto_refresh: AtomicBool::new(config.general.auto_refresh),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh.load(Ordering::Relaxed)
    }

    /// Current view parameters.
    pub fn view(&self) -> ViewState {
        lock(&self.shared).view.clone()
    }

    /// Rows from the latest sample, in display order.
    pub fn rows(&self) -> Arc<[ProcessSnapshot]> {
        Arc::clone(&lock(&self.shared).rows)
    }

    /// Resample and install the result. The collector stays held until the
    /// sample is installed, so samples land in the order they were taken and
    /// a sort change made meanwhile waits, then resamples with the new order.
    pub fn refresh(&self) {
        let mut collector = lock(&self.collector);
        let sort = lock(&self.shared).view.sort;
        let sample = collector.refresh(&sort);

        let mut shared = lock(&self.shared);
        shared.rows = Arc::from(sample.rows);
        shared.system = Arc::new(sample.system);
    }

    /// Render the current state and write it to the screen.
    pub fn draw(&self) -> Result<()> {
        let _draw_span = tracing::debug_span!("app.draw").entered();
        let size = (self.size)();

        let mut screen = lock(&self.screen);
        let (view, rows, system) = {
            let mut shared = lock(&self.shared);
            let layout = Layout::compute(size, shared.view.columns.len(), &self.hint);
            shared.view.apply_layout(&layout);
            let total = shared.rows.len();
            shared.view.clamp(total);
            (
                shared.view.clone(),
                Arc::clone(&shared.rows),
                Arc::clone(&shared.system),
            )
        };

        let output = ui::draw(
            &Frame {
                rows: &rows,
                view: &view,
                system: &system,
                size,
                hint: &self.hint,
            },
            &self.theme,
        );
        screen.write_all(output.as_bytes())?;
        screen.flush()?;
        Ok(())
    }

    pub fn refresh_and_draw(&self) -> Result<()> {
        self.refresh();
        self.draw()
    }

    /// Apply one user action. The view changes before the redraw; a sort
    /// change resamples first.
    pub fn dispatch(&self, action: Action) -> Result<Flow> {
        let resample = {
            let mut shared = lock(&self.shared);
            let total = shared.rows.len();
            let view = &mut shared.view;
            match action {
                Action::Quit => return Ok(Flow::Quit),
                Action::ScrollUp => {
                    view.scroll_up();
                    false
                }
                Action::ScrollDown => {
                    view.scroll_down(total);
                    false
                }
                Action::PageDown => {
                    view.page_down(total);
                    false
                }
                Action::SortColumn(index) => view.select_column(index),
                Action::HeaderClick(offset) => view.click_header(offset),
            }
        };
        debug!(?action, resample, "dispatch");

        self.auto_refresh.store(true, Ordering::Relaxed);
        if resample {
            self.refresh();
        }
        self.draw()?;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::system::capability::{CapabilityKind, CpuProvider, LoadAverage, Provider};
    use crate::system::platform::Platform;
    use crate::system::process::ProcessTable;
    use crate::system::registry::CapabilityRegistry;
    use crate::view::{Column, SortSpec};
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::thread;
    use std::time::Duration;

    struct CountingTable {
        pids: Vec<u32>,
        refreshes: Arc<AtomicUsize>,
    }

    impl ProcessTable for CountingTable {
        fn refresh(&mut self) -> Vec<u32> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            self.pids.clone()
        }

        fn user(&self, _pid: u32) -> crate::error::Result<String> {
            Ok("root".to_string())
        }
    }

    /// Stalls one refresh, once armed, until the test releases it.
    struct GatedTable {
        pids: Vec<u32>,
        armed: Arc<AtomicBool>,
        entered: Sender<()>,
        release: Receiver<()>,
    }

    impl ProcessTable for GatedTable {
        fn refresh(&mut self) -> Vec<u32> {
            if self.armed.swap(false, Ordering::SeqCst) {
                let _ = self.entered.send(());
                let _ = self.release.recv();
            }
            self.pids.clone()
        }

        fn user(&self, _pid: u32) -> crate::error::Result<String> {
            Ok("root".to_string())
        }
    }

    struct PidCpu;

    impl CpuProvider for PidCpu {
        fn process_cpu_percent(&self, pid: u32) -> crate::error::Result<f64> {
            Ok(f64::from(pid))
        }

        fn usage_percent(&self, _window: Duration) -> crate::error::Result<f64> {
            Ok(1.0)
        }

        fn load_average(&self) -> crate::error::Result<LoadAverage> {
            Err(Error::malformed("loadavg", "empty"))
        }
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn take(&self) -> String {
            String::from_utf8(std::mem::take(&mut *self.0.lock().unwrap())).unwrap()
        }
    }

    fn app(pids: Vec<u32>, size: TermSize) -> (App, Arc<AtomicUsize>, Capture) {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let table = CountingTable {
            pids,
            refreshes: Arc::clone(&refreshes),
        };
        let (app, capture) = app_with(Box::new(table), size);
        (app, refreshes, capture)
    }

    fn app_with(table: Box<dyn ProcessTable>, size: TermSize) -> (App, Capture) {
        let registry = Arc::new(CapabilityRegistry::with_factory(
            Platform::Linux,
            |_, kind| match kind {
                CapabilityKind::Cpu => Ok(Provider::Cpu(Arc::new(PidCpu))),
                other => Err(Error::ProviderUnavailable(other)),
            },
        ));
        let collector = Collector::new(registry, table).with_cpu_window(Duration::ZERO);
        let capture = Capture::default();
        let app = App::new(
            collector,
            &Config::default(),
            Box::new(capture.clone()),
            Box::new(move || size),
        )
        .with_theme(Theme::plain());
        (app, capture)
    }

    #[test]
    fn double_header_click_toggles_direction_and_resamples_twice() {
        let (app, refreshes, _) = app((1..=5).collect(), TermSize::FALLBACK);
        app.refresh_and_draw().unwrap();
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        // defaults: pid name user cpu memory, 16 wide
        assert_eq!(app.view().cell_width, 16);

        app.dispatch(Action::HeaderClick(5)).unwrap();
        assert_eq!(
            app.view().sort,
            SortSpec {
                column: Column::Pid,
                ascending: true
            }
        );
        app.dispatch(Action::HeaderClick(5)).unwrap();
        assert_eq!(
            app.view().sort,
            SortSpec {
                column: Column::Pid,
                ascending: false
            }
        );
        assert_eq!(refreshes.load(Ordering::SeqCst), 3);
        let order: Vec<u32> = app.rows().iter().map(|r| r.pid).collect();
        assert_eq!(order, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn scrolling_redraws_without_resampling() {
        let size = TermSize {
            rows: 6,
            columns: 80,
        };
        let (app, refreshes, capture) = app((1..=20).collect(), size);
        app.refresh_and_draw().unwrap();
        capture.take();

        assert_eq!(app.dispatch(Action::ScrollDown).unwrap(), Flow::Continue);
        assert_eq!(app.view().scroll_index, 1);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert!(capture.take().contains("Showing 2-"));
    }

    #[test]
    fn out_of_range_sort_column_is_ignored() {
        let (app, refreshes, _) = app(vec![1, 2], TermSize::FALLBACK);
        app.refresh_and_draw().unwrap();
        let before = app.view().sort;

        app.dispatch(Action::SortColumn(9)).unwrap();
        assert_eq!(app.view().sort, before);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn quit_stops_without_drawing() {
        let (app, _, capture) = app(vec![1], TermSize::FALLBACK);
        assert_eq!(app.dispatch(Action::Quit).unwrap(), Flow::Quit);
        assert!(capture.take().is_empty());
    }

    #[test]
    fn repeated_draws_write_identical_frames() {
        let (app, _, capture) = app((1..=40).collect(), TermSize::FALLBACK);
        app.refresh();
        app.draw().unwrap();
        let first = capture.take();
        app.draw().unwrap();
        assert_eq!(first, capture.take());
    }

    #[test]
    fn any_input_turns_auto_refresh_on() {
        let (app, _, _) = app(vec![1], TermSize::FALLBACK);
        app.auto_refresh.store(false, Ordering::Relaxed);
        app.refresh_and_draw().unwrap();
        app.dispatch(Action::ScrollUp).unwrap();
        assert!(app.auto_refresh());
    }

    #[test]
    fn draw_clamps_scroll_after_rows_shrink() {
        let size = TermSize {
            rows: 6,
            columns: 80,
        };
        let (app, _, _) = app((1..=10).collect(), size);
        app.refresh_and_draw().unwrap();
        for _ in 0..20 {
            app.dispatch(Action::ScrollDown).unwrap();
        }
        // 6 rows minus header and two footer lines
        assert_eq!(app.view().scroll_index, 7);

        let fewer: Arc<[ProcessSnapshot]> = app.rows()[..4].to_vec().into();
        lock(&app.shared).rows = fewer;
        app.draw().unwrap();
        assert_eq!(app.view().scroll_index, 1);
    }

    #[test]
    fn sort_change_during_a_refresh_ends_on_the_new_order() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let armed = Arc::new(AtomicBool::new(false));
        let table = GatedTable {
            pids: (1..=5).collect(),
            armed: Arc::clone(&armed),
            entered: entered_tx,
            release: release_rx,
        };
        let (app, capture) = app_with(Box::new(table), TermSize::FALLBACK);
        let app = Arc::new(app);
        app.refresh_and_draw().unwrap();
        capture.take();

        // the tick reads cpu descending, then stalls inside enumeration
        armed.store(true, Ordering::SeqCst);
        let tick = {
            let app = Arc::clone(&app);
            thread::spawn(move || app.refresh())
        };
        entered_rx.recv().unwrap();

        // cpu is column 3; selecting it again flips to ascending
        let click = {
            let app = Arc::clone(&app);
            thread::spawn(move || app.dispatch(Action::SortColumn(3)).unwrap())
        };
        while !app.view().sort.ascending {
            thread::yield_now();
        }
        thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();

        tick.join().unwrap();
        assert_eq!(click.join().unwrap(), Flow::Continue);

        assert_eq!(
            app.view().sort,
            SortSpec {
                column: Column::Cpu,
                ascending: true
            }
        );
        let order: Vec<u32> = app.rows().iter().map(|r| r.pid).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
        assert!(capture.take().contains("CPU % ^"));
    }
}
