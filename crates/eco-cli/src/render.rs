//! Console rendering of the island.

use eco_world::Grid;

/// Box-framed grid followed by the census line
pub fn render_frame(grid: &Grid, tick: u64) -> String {
    // Glyphs are double-width in most terminals
    let border = "═".repeat(grid.width.max(0) as usize * 2);

    let mut frame = String::new();
    frame.push_str(&format!("╔{}╗\n", border));
    for row in grid.symbol_rows() {
        frame.push_str(&format!("║{}║\n", row));
    }
    frame.push_str(&format!("╚{}╝\n", border));
    frame.push_str(&format!("Tick {}: {}", tick, grid.census()));
    frame
}
