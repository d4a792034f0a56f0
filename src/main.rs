/// Region pager demo session
///
/// Usage: region_pager [config.toml]
///
/// Pages in a block of regions around the origin (loading saved ones,
/// generating the rest), paints a marker tile, saves everything, then walks
/// a few steps east evicting regions that fall out of range.

use anyhow::Context;
use region_pager::{PagerConfig, RegionPager, RegionPos};

/// Regions kept resident on each side of the focus region
const VIEW_RADIUS: i32 = 1;
const WALK_STEPS: i32 = 3;
const MARKER_TILE: i32 = 99;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => PagerConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => {
            log::info!("No config given, using defaults");
            PagerConfig::default()
        }
    };

    let mut pager = RegionPager::from_config(&config).context("building region pager")?;

    pager.set_on_load(|_pager, region| {
        log::info!("Loaded region {}", region.borrow().position());
        Ok(())
    });
    pager.set_on_create(|_pager, region| {
        log::info!("Generated region {}", region.borrow().position());
        Ok(())
    });
    pager.set_on_unload(|pager, region| {
        // Unload fires before removal, so the region can still be written out
        let pos = region.borrow().position();
        pager.save_region(pos)?;
        log::info!("Unloaded region {}", pos);
        Ok(())
    });

    let mut focus = RegionPos::new(0, 0);
    page_in_around(&mut pager, focus)?;

    let origin = focus
        .origin_tile(pager.region_size())
        .context("focus region lies outside the tile grid")?;
    let previous = pager.set_tile(origin.x, origin.y, MARKER_TILE)?;
    log::info!(
        "Marker at tile ({}, {}), previous id {:?}",
        origin.x,
        origin.y,
        previous
    );

    let saved = pager.save_all()?;
    println!("Saved {} regions", saved);

    for _ in 0..WALK_STEPS {
        focus = focus.offset(1, 0);
        let evicted = pager.unload_if(|region| region.position().chebyshev_distance(focus) > VIEW_RADIUS.unsigned_abs())?;
        page_in_around(&mut pager, focus)?;
        println!(
            "Focus {}: evicted {}, {} resident",
            focus,
            evicted,
            pager.container_size()
        );
    }

    let evicted = pager.unload_if(|_| true)?;
    println!("Shutdown: evicted {} regions", evicted);
    Ok(())
}

/// Make every region within `VIEW_RADIUS` of `focus` resident
fn page_in_around(pager: &mut RegionPager, focus: RegionPos) -> anyhow::Result<()> {
    for dy in -VIEW_RADIUS..=VIEW_RADIUS {
        for dx in -VIEW_RADIUS..=VIEW_RADIUS {
            let pos = focus.offset(dx, dy);
            if pager.load_region(pos)?.is_none() {
                pager.create_region(pos)?;
            }
        }
    }
    Ok(())
}
