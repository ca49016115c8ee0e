use std::sync::Arc;
use std::time::{Duration, Instant};

use musubi::{
    CancelToken, ContentCache, Dispatcher, Element, MemoryCache, Occupant, Outcome, Pool, Task,
    UiLoop, Work,
};

/// This example simulates a scrolling list whose rows are recycled.
///
/// It shows how to:
/// 1. Describe the work for one row with the `Work` trait.
/// 2. Consult a cache from `on_bind` to skip work already done.
/// 3. Let `Pool::submit` bind on the UI thread and execute on workers.
/// 4. Pump the UI loop to apply the delivered content.
///
/// Only a handful of row elements exist. Scrolling rebinds them to new items,
/// which cancels the tasks still loading for the items scrolled away.
const ROWS: usize = 6;
const ITEMS: u32 = 60;

#[derive(Clone, Debug, PartialEq)]
enum Swatch {
    Loading,
    Cancelled,
    Color(u32),
}

struct Delayed {
    id: u32,
    delay: Duration,
    cache: Arc<MemoryCache<u32, Swatch>>,
}

impl Work for Delayed {
    type Key = u32;
    type Content = Swatch;

    fn key(&self) -> Option<&u32> {
        Some(&self.id)
    }

    fn loading(&self) -> Swatch {
        Swatch::Loading
    }

    fn cancelled(&self) -> Swatch {
        Swatch::Cancelled
    }

    fn on_bind(&self) -> Option<Swatch> {
        self.cache.get(&self.id)
    }

    fn execute(&self, token: &CancelToken) -> anyhow::Result<Swatch> {
        // Simulate slow work. Cancelling the task wakes us up early.
        if token.wait_timeout(self.delay) {
            return Ok(Swatch::Cancelled);
        }

        let swatch = Swatch::Color(self.id.wrapping_mul(0x9E37_79B9) & 0xFF_FFFF);
        self.cache.insert(self.id, swatch.clone());
        Ok(swatch)
    }
}

fn main() -> anyhow::Result<()> {
    musubi::logging::init()?;

    let ui = UiLoop::new();
    let dispatcher: Arc<dyn Dispatcher> = Arc::new(ui.handle());
    let pool = Pool::builder().threads(5).build()?;
    let cache = Arc::new(MemoryCache::new());

    let rows: Vec<_> = (0..ROWS).map(|_| Arc::new(Element::new())).collect();

    // Scroll down through the list and back up to the top once.
    let positions = (0..=ITEMS - ROWS as u32).chain((0..ITEMS - ROWS as u32).rev());

    let start = Instant::now();
    let mut scheduled = 0;
    let mut skipped = 0;

    for top in positions {
        for (offset, row) in rows.iter().enumerate() {
            let id = top + offset as u32;
            let work = Delayed {
                id,
                delay: Duration::from_millis(40),
                cache: cache.clone(),
            };

            let task = Task::image(work, row, dispatcher.clone());
            task.set_listener(|task: &dyn Occupant<u32>, _: &Swatch, outcome: &Outcome| {
                tracing::debug!(task = %task.id(), ?outcome, "row loaded");
            });

            match pool.submit(task) {
                true => scheduled += 1,
                false => skipped += 1,
            }
        }

        // One frame: apply whatever the workers delivered meanwhile.
        ui.pump_timeout(Duration::from_millis(8));
    }

    // Let the rows still loading settle.
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        ui.pump_timeout(Duration::from_millis(50));
    }

    for (i, row) in rows.iter().enumerate() {
        println!("row {i}: {:?}", row.image());
    }
    println!(
        "scheduled {scheduled}, skipped {skipped}, cached {} items in {:?}",
        cache.len(),
        start.elapsed()
    );

    Ok(())
}
