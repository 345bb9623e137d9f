use egui::Color32;

use paddock::session::Compound;

pub(crate) mod config;
pub(crate) mod dashboard;

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const PALETTE_BROWN: Color32 = Color32::from_rgb(72, 30, 20);
pub(crate) const PALETTE_MAROON: Color32 = Color32::from_rgb(155, 57, 34);
pub(crate) const PALETTE_ORANGE: Color32 = Color32::from_rgb(242, 97, 63);

const UNKNOWN_TEAM_COLOR: Color32 = Color32::from_rgb(128, 128, 128);

/// Team liveries, matched case-insensitively against the start or the body of a team name so
/// sponsor prefixes and suffixes still resolve.
const TEAM_COLORS: [(&str, Color32); 16] = [
    ("red bull", Color32::from_rgb(54, 113, 198)),
    ("ferrari", Color32::from_rgb(232, 0, 32)),
    ("mercedes", Color32::from_rgb(39, 244, 210)),
    ("mclaren", Color32::from_rgb(255, 128, 0)),
    ("aston martin", Color32::from_rgb(34, 153, 113)),
    ("racing point", Color32::from_rgb(245, 150, 200)),
    ("force india", Color32::from_rgb(245, 150, 200)),
    ("alpine", Color32::from_rgb(0, 147, 204)),
    ("renault", Color32::from_rgb(255, 245, 0)),
    ("williams", Color32::from_rgb(100, 196, 255)),
    ("alphatauri", Color32::from_rgb(94, 143, 170)),
    ("toro rosso", Color32::from_rgb(70, 155, 255)),
    ("rb", Color32::from_rgb(102, 146, 255)),
    ("sauber", Color32::from_rgb(82, 226, 82)),
    ("alfa romeo", Color32::from_rgb(155, 0, 0)),
    ("haas", Color32::from_rgb(182, 186, 189)),
];

pub(crate) fn team_color(team: &str) -> Color32 {
    let team = team.to_lowercase();
    TEAM_COLORS
        .iter()
        .find(|(name, _)| {
            team == *name
                || team.starts_with(&format!("{} ", name))
                || team.ends_with(&format!(" {}", name))
                || (name.len() > 2 && team.contains(name))
        })
        .map(|(_, color)| *color)
        .unwrap_or(UNKNOWN_TEAM_COLOR)
}

pub(crate) fn compound_color(compound: Option<Compound>) -> Color32 {
    match compound {
        Some(Compound::Soft) => Color32::from_rgb(218, 41, 28),
        Some(Compound::Medium) => Color32::from_rgb(255, 210, 0),
        Some(Compound::Hard) => Color32::from_rgb(240, 240, 236),
        Some(Compound::Intermediate) => Color32::from_rgb(67, 176, 42),
        Some(Compound::Wet) => Color32::from_rgb(0, 103, 173),
        None => Color32::from_rgb(0, 255, 255),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_color_lookup() {
        assert_eq!(team_color("Ferrari"), Color32::from_rgb(232, 0, 32));
        assert_eq!(team_color("Oracle Red Bull Racing"), team_color("Red Bull Racing"));
        assert_eq!(team_color("RB"), Color32::from_rgb(102, 146, 255));
        assert_eq!(team_color("Visa Cash App RB"), team_color("RB"));
        assert_eq!(team_color("Kick Sauber"), Color32::from_rgb(82, 226, 82));
        // "rb" only matches as a whole word
        assert_eq!(team_color("Forbidden Motors"), UNKNOWN_TEAM_COLOR);
    }
}
