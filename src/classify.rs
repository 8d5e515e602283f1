//! Classification on top of the metrics: W clusters, archetype resonance,
//! composite Q / FII scores and the initial-impulse type of the first letter.
//!
//! Two W partitions exist and are deliberately kept apart:
//! [`cluster_by_w`] (four bins, drives reports and advice) and
//! [`diagnostic_cluster`] (five bins with `rt2`, used only for library
//! quality summaries). They disagree on e.g. W = 1.3 (`phi` vs `rt2`) and on
//! W < 1 (`pi` vs `phi`).

use serde::{Deserialize, Serialize};

// ============================================================================
// Clusters
// ============================================================================

/// Four-bin W cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cluster {
    #[serde(rename = "phi")]
    Phi,
    #[serde(rename = "e")]
    E,
    #[serde(rename = "e-pi")]
    EPi,
    #[serde(rename = "pi")]
    Pi,
}

impl Cluster {
    pub fn code(self) -> &'static str {
        match self {
            Cluster::Phi => "phi",
            Cluster::E => "e",
            Cluster::EPi => "e-pi",
            Cluster::Pi => "pi",
        }
    }

    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            Cluster::Phi => "φ-ядро",
            Cluster::E => "e",
            Cluster::EPi => "e–π",
            Cluster::Pi => "π",
        }
    }

    /// Fixed advice string for the cluster.
    pub fn advice(self) -> &'static str {
        match self {
            Cluster::Phi => "Гармония и стабильность. Совет: добавить e-слово (движение).",
            Cluster::E => "Рост и импульс. Совет: добавить φ-слово (покой).",
            Cluster::EPi => "Прорыв, интенсивность. Совет: внести равновесие φ или √2.",
            Cluster::Pi => "Турбулентность. Совет: успокоить через φ и Z.",
        }
    }

    /// Longer guidance on which words to combine with.
    pub fn guidance(self) -> &'static str {
        match self {
            Cluster::Phi => {
                "Добавь e-слова (ПУТЬ, ДВИЖЕНИЕ, ПРОЦЕСС). Для углубления — √2-слова (ЗЕРКАЛО, ОТРАЖЕНИЕ)."
            }
            Cluster::E => "Дополни φ-словами (СПОКОЙ, РАВНОВЕСИЕ)…",
            Cluster::EPi => "Сильный всплеск. Соедини с φ/√2, чтобы не увести в турбулентность…",
            Cluster::Pi => {
                "Снизь напряжение через φ и повышение Z: комбинации со словами покоя/симметрии…"
            }
        }
    }
}

/// Four-bin partition: [1.0, 1.6) phi, [1.6, 2.7) e, [2.7, 3.2) e-pi,
/// everything else (W ≥ 3.2, and also W < 1.0) pi.
pub fn cluster_by_w(w: f64) -> Cluster {
    if (1.0..1.6).contains(&w) {
        Cluster::Phi
    } else if (1.6..2.7).contains(&w) {
        Cluster::E
    } else if (2.7..3.2).contains(&w) {
        Cluster::EPi
    } else {
        Cluster::Pi
    }
}

/// Five-bin diagnostic cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCluster {
    #[serde(rename = "phi")]
    Phi,
    #[serde(rename = "e")]
    E,
    #[serde(rename = "e-pi")]
    EPi,
    #[serde(rename = "pi")]
    Pi,
    #[serde(rename = "rt2")]
    Rt2,
}

impl DiagnosticCluster {
    pub const ALL: [DiagnosticCluster; 5] = [
        DiagnosticCluster::Phi,
        DiagnosticCluster::E,
        DiagnosticCluster::EPi,
        DiagnosticCluster::Pi,
        DiagnosticCluster::Rt2,
    ];

    pub fn code(self) -> &'static str {
        match self {
            DiagnosticCluster::Phi => "phi",
            DiagnosticCluster::E => "e",
            DiagnosticCluster::EPi => "e-pi",
            DiagnosticCluster::Pi => "pi",
            DiagnosticCluster::Rt2 => "rt2",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

/// Five-bin partition: [1.214, 1.614] rt2 is checked first, then the four
/// regular bins; W < 1.0 lands in phi.
pub fn diagnostic_cluster(w: f64) -> DiagnosticCluster {
    if (1.214..=1.614).contains(&w) {
        DiagnosticCluster::Rt2
    } else if (1.0..1.6).contains(&w) {
        DiagnosticCluster::Phi
    } else if (1.6..2.7).contains(&w) {
        DiagnosticCluster::E
    } else if (2.7..3.2).contains(&w) {
        DiagnosticCluster::EPi
    } else if w >= 3.2 {
        DiagnosticCluster::Pi
    } else {
        DiagnosticCluster::Phi
    }
}

// ============================================================================
// Resonance
// ============================================================================

/// Archetype constants, in canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Archetype {
    #[serde(rename = "phi")]
    Phi,
    #[serde(rename = "e")]
    E,
    #[serde(rename = "pi")]
    Pi,
    #[serde(rename = "rt2")]
    Rt2,
}

impl Archetype {
    pub const ALL: [Archetype; 4] = [Archetype::Phi, Archetype::E, Archetype::Pi, Archetype::Rt2];

    pub fn target(self) -> f64 {
        match self {
            Archetype::Phi => 1.618,
            Archetype::E => 2.718,
            Archetype::Pi => 3.142,
            Archetype::Rt2 => 1.414,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Archetype::Phi => "φ",
            Archetype::E => "e",
            Archetype::Pi => "π",
            Archetype::Rt2 => "√2",
        }
    }

    /// Similarity of W to this archetype: exp(−|W − target|).
    pub fn score(self, w: f64) -> f64 {
        (-(w - self.target()).abs()).exp()
    }
}

/// Display name, English and Russian description of an archetype pair.
/// Both arguments must be in canonical order.
fn pair_labels(a: Archetype, b: Archetype) -> (&'static str, &'static str, &'static str) {
    use Archetype::*;
    match (a, b) {
        (Phi, Rt2) => (
            "φ–√2",
            "Harmony ↔ Duality",
            "Единство через различие — гармония, рождающаяся из двух полюсов.",
        ),
        (Phi, E) => ("φ–e", "Harmony ↔ Growth", "Переход гармонии в движение"),
        (E, Pi) => ("e–π", "Growth ↔ Cycle", "Прорыв и кульминация"),
        (Pi, Rt2) => ("π–√2", "Cycle ↔ Transition", "Завершение и тишина"),
        (Phi, Pi) => ("φ–π", "Harmony ↔ Cycle", "Покой и полнота"),
        (E, Rt2) => ("e–√2", "Growth ↔ Threshold", "Метаморфоза"),
        _ => ("", "", ""),
    }
}

/// The two strongest archetypes for a W value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResonancePair {
    /// Canonically ordered pair; always present.
    pub archetypes: (Archetype, Archetype),
    /// Display code, empty when below threshold.
    pub code: String,
    pub en: String,
    pub ru: String,
    /// sqrt(R_k1 · R_k2), reported even below threshold.
    pub strength: f64,
}

impl ResonancePair {
    pub fn is_named(&self) -> bool {
        !self.code.is_empty()
    }
}

/// Pick the top two archetypes by score and name the pair.
///
/// Ties keep canonical order (φ, e, π, √2). A pair whose strength is below
/// `threshold` keeps its strength but loses its labels.
pub fn resonance_pair(w: f64, threshold: f64) -> ResonancePair {
    let mut scored: Vec<(Archetype, f64)> =
        Archetype::ALL.iter().map(|&a| (a, a.score(w))).collect();
    // stable: equal scores stay in canonical order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let (k1, v1) = scored[0];
    let (k2, v2) = scored[1];
    let (a, b) = if k1 <= k2 { (k1, k2) } else { (k2, k1) };
    let strength = (v1 * v2).sqrt();

    if strength < threshold {
        return ResonancePair {
            archetypes: (a, b),
            code: String::new(),
            en: String::new(),
            ru: String::new(),
            strength,
        };
    }
    let (code, en, ru) = pair_labels(a, b);
    ResonancePair {
        archetypes: (a, b),
        code: code.to_string(),
        en: en.to_string(),
        ru: ru.to_string(),
        strength,
    }
}

/// All four archetype scores plus the strongest one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResonanceSpace {
    pub r_phi: f64,
    pub r_e: f64,
    pub r_pi: f64,
    pub r_rt2: f64,
    pub max: Archetype,
    pub max_value: f64,
}

pub fn resonance_space(w: f64) -> ResonanceSpace {
    let mut max = Archetype::Phi;
    let mut max_value = Archetype::Phi.score(w);
    for a in &Archetype::ALL[1..] {
        let v = a.score(w);
        if v > max_value {
            max = *a;
            max_value = v;
        }
    }
    ResonanceSpace {
        r_phi: Archetype::Phi.score(w),
        r_e: Archetype::E.score(w),
        r_pi: Archetype::Pi.score(w),
        r_rt2: Archetype::Rt2.score(w),
        max,
        max_value,
    }
}

// ============================================================================
// Composite scores
// ============================================================================

/// Q: mean of Z, C and Hm.
pub fn q_total(z: f64, c: f64, hm: f64) -> f64 {
    (z + c + hm) / 3.0
}

/// FII: affine combination of Z, Q, C, Hm rescaled to roughly [−10, 10].
pub fn fii(z: f64, q: f64, c: f64, hm: f64) -> f64 {
    10.0 * (0.4 * z + 0.3 * q + 0.2 * c + 0.1 * hm - 0.5)
}

/// Five FII categories split at −6, −2, 2 and 6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FiiCategory {
    Destroyer,
    Dissipator,
    Neutral,
    Harmonizer,
    Resonator,
}

impl FiiCategory {
    /// `fii ≤ −6`, `≤ −2`, `< 2`, `< 6`, else.
    pub fn from_fii(fii: f64) -> Self {
        if fii <= -6.0 {
            FiiCategory::Destroyer
        } else if fii <= -2.0 {
            FiiCategory::Dissipator
        } else if fii < 2.0 {
            FiiCategory::Neutral
        } else if fii < 6.0 {
            FiiCategory::Harmonizer
        } else {
            FiiCategory::Resonator
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FiiCategory::Destroyer => "Разрушитель",
            FiiCategory::Dissipator => "Ослабитель",
            FiiCategory::Neutral => "Нейтральное",
            FiiCategory::Harmonizer => "Гармонизатор",
            FiiCategory::Resonator => "Резонатор",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FiiCategory::Destroyer => "создаёт напряжение, дестабилизирует поле",
            FiiCategory::Dissipator => "рассеивает энергию, снижает фокус",
            FiiCategory::Neutral => "сбалансированное, не влияет заметно",
            FiiCategory::Harmonizer => "усиливает гармонию и согласие",
            FiiCategory::Resonator => "максимально усиливает поле, световой пик",
        }
    }
}

const BAR_FILLED: char = '▰';
const BAR_EMPTY: char = '▱';

fn bar(filled: usize, length: usize) -> String {
    let filled = filled.min(length);
    std::iter::repeat(BAR_FILLED)
        .take(filled)
        .chain(std::iter::repeat(BAR_EMPTY).take(length - filled))
        .collect()
}

fn round_cells(x: f64, length: usize) -> usize {
    x.round_ties_even().clamp(0.0, length as f64) as usize
}

/// Ten-cell bar for a value in [0, 1].
pub fn metric_bar(value: f64) -> String {
    bar(round_cells(value.clamp(0.0, 1.0) * 10.0, 10), 10)
}

/// Ten-cell bar for Q.
pub fn q_bar(q: f64) -> String {
    bar(round_cells(q * 10.0, 10), 10)
}

/// Ten-cell bar for FII, one cell per two points above −10.
pub fn fii_bar(fii: f64) -> String {
    bar(round_cells((fii + 10.0) / 2.0, 10), 10)
}

// ============================================================================
// Initial impulse
// ============================================================================

/// Type of the first letter's code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpulseKind {
    Active,
    Harmonic,
    Transitional,
    Turbulent,
    Inverse,
    Undefined,
}

/// (type, action, phase) triple for the first letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct InitialImpulse {
    pub kind: ImpulseKind,
    pub type_name: Option<&'static str>,
    pub action: Option<&'static str>,
    pub phase: Option<&'static str>,
}

impl InitialImpulse {
    const UNDEFINED: InitialImpulse = InitialImpulse {
        kind: ImpulseKind::Undefined,
        type_name: None,
        action: None,
        phase: None,
    };

    fn new(
        kind: ImpulseKind,
        type_name: &'static str,
        action: &'static str,
        phase: &'static str,
    ) -> Self {
        InitialImpulse {
            kind,
            type_name: Some(type_name),
            action: Some(action),
            phase: Some(phase),
        }
    }
}

/// Bucket a first-letter code into [1,7], [8,16], [17,22], [23,25], [26,33].
/// Zero, missing or larger values are `Undefined`.
pub fn classify_initial(value: Option<u32>) -> InitialImpulse {
    match value {
        Some(1..=7) => {
            InitialImpulse::new(ImpulseKind::Active, "Активная", "импульс наружу", "запуск")
        }
        Some(8..=16) => InitialImpulse::new(
            ImpulseKind::Harmonic,
            "Гармоничная",
            "равновесие",
            "стабилизация",
        ),
        Some(17..=22) => {
            InitialImpulse::new(ImpulseKind::Transitional, "Переходная", "сдвиг", "адаптация")
        }
        Some(23..=25) => {
            InitialImpulse::new(ImpulseKind::Turbulent, "Турбулентная", "напряжение", "пик")
        }
        Some(26..=33) => InitialImpulse::new(
            ImpulseKind::Inverse,
            "Инверсная",
            "внутренняя работа",
            "возврат к ядру",
        ),
        _ => InitialImpulse::UNDEFINED,
    }
}
