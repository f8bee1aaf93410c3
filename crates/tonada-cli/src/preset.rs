//! Synth presets.
//!
//! A preset is the full patch: waveform, amplitude envelope, and the
//! filter section with its own envelope. Three factory presets ship
//! built-in; anything else loads from a TOML file of the same shape:
//!
//! ```toml
//! name = "hollow"
//! waveform = "square"
//!
//! [amp]
//! attack = 0.01
//! decay = 0.5
//! sustain = 1.0
//! release = 1.0
//!
//! [filter]
//! cutoff = 0.99
//! resonance = 0.0
//! envelope = { attack = 0.01, decay = 0.5, sustain = 1.0, release = 1.0 }
//! ```

use std::path::Path;

use serde::Deserialize;
use tonada_engine::{Synth, Waveform};

/// A complete patch.
#[derive(Debug, Clone, Deserialize)]
pub struct Preset {
    /// Name of the preset.
    pub name: String,
    /// Optional description shown by `--list-presets`.
    #[serde(default)]
    pub description: Option<String>,
    /// Waveform name: sine, saw, square or triangle.
    #[serde(default = "default_waveform")]
    pub waveform: String,
    /// Amplitude envelope.
    pub amp: Adsr,
    /// Filter section.
    pub filter: FilterSection,
}

/// Envelope values: times in seconds, sustain as a level.
#[derive(Debug, Clone, Deserialize)]
pub struct Adsr {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

/// Filter settings plus its modulation envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSection {
    pub cutoff: f64,
    pub resonance: f64,
    pub envelope: Adsr,
}

fn default_waveform() -> String {
    "square".to_string()
}

impl Preset {
    /// Push the whole patch through the synth's control surface.
    pub fn apply(&self, synth: &Synth) -> anyhow::Result<()> {
        synth.set_waveform(parse_waveform(&self.waveform)?);

        synth.set_attack(self.amp.attack);
        synth.set_decay(self.amp.decay);
        synth.set_sustain(self.amp.sustain);
        synth.set_release(self.amp.release);

        synth.set_cutoff(self.filter.cutoff);
        synth.set_resonance(self.filter.resonance);
        synth.set_filter_attack(self.filter.envelope.attack);
        synth.set_filter_decay(self.filter.envelope.decay);
        synth.set_filter_sustain(self.filter.envelope.sustain);
        synth.set_filter_release(self.filter.envelope.release);
        Ok(())
    }
}

fn parse_waveform(name: &str) -> anyhow::Result<Waveform> {
    match name.to_lowercase().as_str() {
        "sine" => Ok(Waveform::Sine),
        "saw" | "sawtooth" => Ok(Waveform::Saw),
        "square" => Ok(Waveform::Square),
        "triangle" => Ok(Waveform::Triangle),
        other => anyhow::bail!("unknown waveform '{other}' (sine, saw, square, triangle)"),
    }
}

/// The built-in patches.
pub fn factory_presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "default".into(),
            description: Some("short attack, long release, wide-open filter".into()),
            waveform: "square".into(),
            amp: Adsr {
                attack: 0.01,
                decay: 0.5,
                sustain: 1.0,
                release: 1.0,
            },
            filter: FilterSection {
                cutoff: 0.99,
                resonance: 0.0,
                envelope: Adsr {
                    attack: 0.01,
                    decay: 0.5,
                    sustain: 1.0,
                    release: 1.0,
                },
            },
        },
        Preset {
            name: "acid".into(),
            description: Some("low cutoff, heavy resonance, fast filter sweep".into()),
            waveform: "square".into(),
            amp: Adsr {
                attack: 0.01,
                decay: 0.4,
                sustain: 0.5,
                release: 0.4,
            },
            filter: FilterSection {
                cutoff: 0.15,
                resonance: 0.90,
                envelope: Adsr {
                    attack: 0.35,
                    decay: 0.40,
                    sustain: 0.01,
                    release: 0.01,
                },
            },
        },
        Preset {
            name: "pluck".into(),
            description: Some("no sustain, long decay on both envelopes".into()),
            waveform: "square".into(),
            amp: Adsr {
                attack: 0.01,
                decay: 1.5,
                sustain: 0.01,
                release: 1.5,
            },
            filter: FilterSection {
                cutoff: 0.85,
                resonance: 0.85,
                envelope: Adsr {
                    attack: 0.5,
                    decay: 1.5,
                    sustain: 0.01,
                    release: 1.5,
                },
            },
        },
    ]
}

/// Resolve a preset by factory name or, failing that, as a TOML file path.
pub fn find(name_or_path: &str) -> anyhow::Result<Preset> {
    if let Some(preset) = factory_presets()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name_or_path))
    {
        return Ok(preset);
    }

    let path = Path::new(name_or_path);
    if path.is_file() {
        let text = std::fs::read_to_string(path)?;
        let preset: Preset = toml::from_str(&text)?;
        return Ok(preset);
    }

    anyhow::bail!(
        "no preset named '{name_or_path}' and no such file (factory presets: {})",
        factory_presets()
            .iter()
            .map(|p| p.name.clone())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_presets_resolve_by_name() {
        for name in ["default", "acid", "pluck", "ACID"] {
            assert!(find(name).is_ok(), "preset {name} should resolve");
        }
    }

    #[test]
    fn unknown_preset_is_an_error() {
        assert!(find("does-not-exist").is_err());
    }

    #[test]
    fn preset_toml_round_trip() {
        let text = r#"
            name = "hollow"
            waveform = "triangle"

            [amp]
            attack = 0.02
            decay = 0.3
            sustain = 0.8
            release = 0.6

            [filter]
            cutoff = 0.5
            resonance = 0.2
            envelope = { attack = 0.1, decay = 0.2, sustain = 0.9, release = 0.3 }
        "#;
        let preset: Preset = toml::from_str(text).expect("valid preset TOML");
        assert_eq!(preset.name, "hollow");
        assert_eq!(preset.waveform, "triangle");
        assert_eq!(preset.amp.sustain, 0.8);
        assert_eq!(preset.filter.envelope.decay, 0.2);
    }

    #[test]
    fn waveform_names_parse() {
        assert!(parse_waveform("sine").is_ok());
        assert!(parse_waveform("SAW").is_ok());
        assert!(parse_waveform("sawtooth").is_ok());
        assert!(parse_waveform("organ").is_err());
    }
}
