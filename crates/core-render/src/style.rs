//! Style lookup.
//!
//! Styles are resolved by pure functions over a closed key set; there is no
//! mutable theme state. Guild tags map through [`guild_style`] with a dim
//! fallback for unknown tags.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn hex(v: u32) -> Self {
        Self((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    pub fn scale(self, f: f64) -> Self {
        Self(
            clamp_channel(self.0 as f64 * f),
            clamp_channel(self.1 as f64 * f),
            clamp_channel(self.2 as f64 * f),
        )
    }

    /// Linear blend from `self` (t = 0) to `to` (t = 1).
    pub fn lerp(self, to: Self, t: f64) -> Self {
        let mix = |a: u8, b: u8| clamp_channel(a as f64 + t * (b as f64 - a as f64));
        Self(mix(self.0, to.0), mix(self.1, to.1), mix(self.2, to.2))
    }
}

fn clamp_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub fg: Option<Rgb>,
    pub bold: bool,
}

impl Style {
    pub const PLAIN: Self = Self { fg: None, bold: false };

    pub const fn fg(c: Rgb) -> Self {
        Self { fg: Some(c), bold: false }
    }

    pub const fn bold(self) -> Self {
        Self { fg: self.fg, bold: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleKey {
    Plain,
    Dim,
    Meta,
    Accent,
    Gold,
    GoldBold,
    Forge,
    Cast,
    GrimVoice,
    SelfName,
    SelfText,
    Text,
    Separator,
    System,
    InputPrompt,
    Mention,
    MentionSelf,
    Link,
}

pub const DIM: Rgb = Rgb::hex(0x8890a0);
pub const META: Rgb = Rgb::hex(0x505868);
pub const ACCENT: Rgb = Rgb::hex(0x34d474);
pub const GOLD: Rgb = Rgb::hex(0xd4a844);
pub const FORGE: Rgb = Rgb::hex(0xf59e0b);
pub const CAST: Rgb = Rgb::hex(0x22d3ee);
pub const GRIM_VOICE: Rgb = Rgb::hex(0xc8a84c);
pub const SELF_NAME: Rgb = Rgb::hex(0xe4e4ec);
pub const INPUT_PROMPT: Rgb = Rgb::hex(0x4ade80);
pub const SELF_TEXT: Rgb = Rgb::hex(0xc0c4d0);
pub const TEXT: Rgb = Rgb::hex(0x8890a0);
pub const SEPARATOR: Rgb = Rgb::hex(0x404858);
pub const MENTION_SELF: Rgb = Rgb::hex(0x86efac);

pub const fn style(key: StyleKey) -> Style {
    match key {
        StyleKey::Plain => Style::PLAIN,
        StyleKey::Dim => Style::fg(DIM),
        StyleKey::Meta => Style::fg(META),
        StyleKey::Accent => Style::fg(ACCENT),
        StyleKey::Gold => Style::fg(GOLD),
        StyleKey::GoldBold => Style::fg(GOLD).bold(),
        StyleKey::Forge => Style::fg(FORGE),
        StyleKey::Cast => Style::fg(CAST),
        StyleKey::GrimVoice => Style::fg(GRIM_VOICE),
        StyleKey::SelfName => Style::fg(SELF_NAME),
        StyleKey::SelfText => Style::fg(SELF_TEXT),
        StyleKey::Text => Style::fg(TEXT),
        StyleKey::Separator | StyleKey::System => Style::fg(SEPARATOR),
        StyleKey::InputPrompt => Style::fg(INPUT_PROMPT),
        StyleKey::Mention => Style::fg(INPUT_PROMPT).bold(),
        StyleKey::MentionSelf => Style::fg(MENTION_SELF).bold(),
        StyleKey::Link => Style::fg(CAST),
    }
}

/// Sender name colour by guild tag.
pub fn guild_style(tag: &str) -> Style {
    let c = match tag {
        "loomari" => Rgb::hex(0x43e88c),
        "ashborne" => Rgb::hex(0xf0944a),
        "amarok" => Rgb::hex(0xb8ccdf),
        "nyx" => Rgb::hex(0xc084e0),
        "cipher" => Rgb::hex(0x34d474),
        "fathom" => Rgb::hex(0x3ecce4),
        _ => DIM,
    };
    Style::fg(c).bold()
}

/// Forge-verdict potency label colour.
pub fn potency_style(potency: &str) -> Style {
    match potency {
        "3" => Style::fg(Rgb::hex(0xffffff)).bold(),
        "2" => Style::fg(Rgb::hex(0xfbbf24)).bold(),
        _ => Style::fg(Rgb::hex(0x92711a)),
    }
}
