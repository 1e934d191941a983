use tracing::debug;
use crate::config::config::GeometryConfig;
use crate::helper::landmark_facts::FingerCurlState::{Extended, Folded, HalfCurled, SidewaysExtended};
use crate::helper::landmark_facts::LandmarkFacts;
use crate::utils::coordinate::{
    LandmarkSet, INDEX_MCP, INDEX_PIP, INDEX_TIP, MIDDLE_DIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP,
    PINKY_TIP, RING_TIP, THUMB_CMC, THUMB_IP, THUMB_TIP,
};

type Predicate = fn(&LandmarkFacts) -> bool;

/// One entry of the ordered letter table.
///
/// `gate` decides whether the rule claims the frame. When it does and a
/// `confirm` predicate exists, the letter is only produced if `confirm` holds
/// as well; either way no later rule is consulted.
#[derive(Clone, Copy)]
pub struct GeometryRule {
    pub name: &'static str,
    pub letter: char,
    gate: Predicate,
    confirm: Option<Predicate>,
}

impl GeometryRule {
    pub fn gate_holds(&self, facts: &LandmarkFacts) -> bool {
        (self.gate)(facts)
    }

    /// evaluate returns `None` when the gate fails, otherwise whether the letter is confirmed.
    pub fn evaluate(&self, facts: &LandmarkFacts) -> Option<bool> {
        if !self.gate_holds(facts) {
            return None
        }
        Some(self.confirm.map_or(true, |confirm| confirm(facts)))
    }
}

impl std::fmt::Debug for GeometryRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryRule")
            .field("name", &self.name)
            .field("letter", &self.letter)
            .field("has_confirm", &self.confirm.is_some())
            .finish()
    }
}

/// The rule that claimed a frame.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch {
    pub rule: &'static GeometryRule,
    pub confirmed: bool,
}

impl RuleMatch {
    pub fn letter(&self) -> Option<char> {
        self.confirmed.then_some(self.rule.letter)
    }
}

/// Ordered letter table. Several gates are deliberately broader than the ones
/// before them, so the order is part of the behaviour.
static RULES: [GeometryRule; 25] = [
    GeometryRule { name: "A", letter: 'A', gate: gate_a, confirm: None },
    GeometryRule { name: "B", letter: 'B', gate: gate_b, confirm: None },
    GeometryRule { name: "C", letter: 'C', gate: gate_c, confirm: None },
    GeometryRule { name: "D", letter: 'D', gate: gate_d, confirm: None },
    GeometryRule { name: "E", letter: 'E', gate: gate_e, confirm: None },
    GeometryRule { name: "F", letter: 'F', gate: gate_f, confirm: None },
    GeometryRule { name: "G", letter: 'G', gate: gate_g, confirm: None },
    GeometryRule { name: "H", letter: 'H', gate: gate_h, confirm: None },
    GeometryRule { name: "I", letter: 'I', gate: gate_i, confirm: Some(pinky_extended) },
    GeometryRule { name: "K", letter: 'K', gate: gate_k, confirm: None },
    GeometryRule { name: "L", letter: 'L', gate: gate_l, confirm: None },
    GeometryRule { name: "M", letter: 'M', gate: gate_m, confirm: None },
    GeometryRule { name: "N", letter: 'N', gate: gate_n, confirm: None },
    GeometryRule { name: "O-curl", letter: 'O', gate: gate_o_curl, confirm: None },
    GeometryRule { name: "T", letter: 'T', gate: gate_t, confirm: None },
    GeometryRule { name: "S", letter: 'S', gate: gate_s, confirm: None },
    GeometryRule { name: "O-tips", letter: 'O', gate: gate_o_tips, confirm: None },
    GeometryRule { name: "P", letter: 'P', gate: gate_p, confirm: Some(pinky_folded) },
    GeometryRule { name: "Q", letter: 'Q', gate: gate_q, confirm: None },
    GeometryRule { name: "R", letter: 'R', gate: gate_r, confirm: None },
    GeometryRule { name: "U", letter: 'U', gate: gate_u, confirm: None },
    GeometryRule { name: "V", letter: 'V', gate: gate_v, confirm: None },
    GeometryRule { name: "W", letter: 'W', gate: gate_w, confirm: None },
    GeometryRule { name: "X", letter: 'X', gate: gate_x, confirm: None },
    GeometryRule { name: "Y", letter: 'Y', gate: gate_y, confirm: Some(pinky_extended) },
];

fn gate_a(f: &LandmarkFacts) -> bool {
    f.above(THUMB_TIP, THUMB_IP)
        && f.left_of(INDEX_PIP, THUMB_IP)
        && f.above(THUMB_TIP, INDEX_PIP)
        && f.count(Folded) == 4
}

fn gate_b(f: &LandmarkFacts) -> bool {
    f.left_of(THUMB_TIP, THUMB_IP) && f.count(Extended) == 4
}

fn gate_c(f: &LandmarkFacts) -> bool {
    f.left_of(INDEX_PIP, THUMB_IP) && f.count(HalfCurled) >= 1 && f.above(INDEX_TIP, THUMB_TIP)
}

fn gate_d(f: &LandmarkFacts) -> bool {
    f.finger_is(0, Extended) && f.count(Folded) == 3 && f.left_of(THUMB_TIP, THUMB_IP)
}

fn gate_e(f: &LandmarkFacts) -> bool {
    f.left_of(THUMB_IP, INDEX_PIP) && f.count(Folded) == 4 && f.above(MIDDLE_TIP, THUMB_TIP)
}

fn gate_f(f: &LandmarkFacts) -> bool {
    f.count(Extended) == 3 && f.finger_is(0, Folded) && f.above(THUMB_TIP, THUMB_IP)
}

fn gate_g(f: &LandmarkFacts) -> bool {
    f.finger_is(0, SidewaysExtended) && f.count(Folded) == 3
}

fn gate_h(f: &LandmarkFacts) -> bool {
    f.finger_is(0, SidewaysExtended) && f.finger_is(1, SidewaysExtended) && f.count(Folded) == 2
}

fn gate_i(f: &LandmarkFacts) -> bool {
    f.left_of(THUMB_TIP, INDEX_PIP) && f.count(Folded) == 3
}

fn gate_k(f: &LandmarkFacts) -> bool {
    f.left_of(THUMB_TIP, INDEX_PIP) && f.left_of(MIDDLE_PIP, THUMB_TIP) && f.count(Extended) == 2
}

fn gate_l(f: &LandmarkFacts) -> bool {
    f.finger_is(0, Extended) && f.count(Folded) == 3 && f.left_of(THUMB_IP, THUMB_TIP)
}

fn gate_m(f: &LandmarkFacts) -> bool {
    f.left_of(THUMB_TIP, RING_TIP) && f.count(Folded) == 4
}

fn gate_n(f: &LandmarkFacts) -> bool {
    f.left_of(THUMB_TIP, MIDDLE_TIP) && f.count(Folded) == 4
}

fn gate_o_curl(f: &LandmarkFacts) -> bool {
    f.left_of(INDEX_PIP, THUMB_IP) && f.above(THUMB_IP, INDEX_PIP) && f.count(HalfCurled) >= 1
}

fn gate_t(f: &LandmarkFacts) -> bool {
    f.left_of(MIDDLE_TIP, THUMB_TIP) && f.above(THUMB_TIP, INDEX_PIP) && f.count(Folded) == 4
}

fn gate_s(f: &LandmarkFacts) -> bool {
    f.left_of(MIDDLE_TIP, THUMB_TIP) && f.above(THUMB_TIP, MIDDLE_TIP) && f.count(Folded) == 4
}

fn gate_o_tips(f: &LandmarkFacts) -> bool {
    [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP].iter().all(|&tip| f.above(THUMB_TIP, tip))
}

fn gate_p(f: &LandmarkFacts) -> bool {
    f.finger_is(2, Folded) && f.above(THUMB_TIP, MIDDLE_TIP) && f.above(INDEX_PIP, THUMB_TIP)
}

fn gate_q(f: &LandmarkFacts) -> bool {
    f.finger_is(1, Folded)
        && f.finger_is(2, Folded)
        && f.finger_is(3, Folded)
        && f.above(INDEX_MCP, INDEX_TIP)
        && f.above(THUMB_TIP, THUMB_CMC)
}

fn gate_r(f: &LandmarkFacts) -> bool {
    f.left_of(INDEX_TIP, MIDDLE_TIP) && f.count(Extended) == 2 && f.left_of(THUMB_TIP, MIDDLE_MCP)
}

fn thumb_tucked_two_up(f: &LandmarkFacts) -> bool {
    f.left_of(THUMB_TIP, INDEX_PIP)
        && f.left_of(THUMB_TIP, MIDDLE_PIP)
        && f.count(Extended) == 2
        && f.above(THUMB_TIP, THUMB_IP)
}

fn gate_u(f: &LandmarkFacts) -> bool {
    thumb_tucked_two_up(f) && f.within_spread(INDEX_TIP, MIDDLE_DIP)
}

fn gate_v(f: &LandmarkFacts) -> bool {
    thumb_tucked_two_up(f)
}

fn gate_w(f: &LandmarkFacts) -> bool {
    f.left_of(THUMB_TIP, INDEX_PIP) && f.left_of(THUMB_TIP, MIDDLE_PIP) && f.count(Extended) == 3
}

fn gate_x(f: &LandmarkFacts) -> bool {
    f.finger_is(0, HalfCurled) && f.count(Folded) == 3 && f.left_of(INDEX_PIP, THUMB_TIP)
}

fn gate_y(f: &LandmarkFacts) -> bool {
    f.count(Folded) == 3 && f.left_of(THUMB_IP, THUMB_TIP)
}

fn pinky_extended(f: &LandmarkFacts) -> bool {
    f.finger_is(3, Extended)
}

fn pinky_folded(f: &LandmarkFacts) -> bool {
    f.finger_is(3, Folded)
}

/// GeometryLetterClassifier maps landmark geometry to a static fingerspelling letter.
#[derive(Debug, Clone)]
pub struct GeometryLetterClassifier {
    config: GeometryConfig,
}

impl GeometryLetterClassifier {
    pub fn new(config: GeometryConfig) -> Self {
        GeometryLetterClassifier { config }
    }

    /// rules returns the letter table in evaluation order.
    pub fn rules() -> &'static [GeometryRule] {
        &RULES
    }

    /// rule looks a rule up by name, e.g. `"O-tips"`.
    pub fn rule(name: &str) -> Option<&'static GeometryRule> {
        RULES.iter().find(|r| r.name == name)
    }

    /// classify extracts the facts of `landmarks` and classifies them.
    /// An incomplete set yields `None`.
    pub fn classify(&self, landmarks: &LandmarkSet) -> Option<char> {
        match LandmarkFacts::extract(landmarks, &self.config) {
            Ok(facts) => self.classify_facts(&facts),
            Err(e) => {
                debug!("geometry classifier skipped frame: {e}");
                None
            }
        }
    }

    pub fn classify_facts(&self, facts: &LandmarkFacts) -> Option<char> {
        self.decide(facts).and_then(|m| m.letter())
    }

    /// decide returns the first rule whose gate holds, if any.
    pub fn decide(&self, facts: &LandmarkFacts) -> Option<RuleMatch> {
        for rule in RULES.iter() {
            if let Some(confirmed) = rule.evaluate(facts) {
                debug!(rule = rule.name, confirmed, "geometry rule claimed frame");
                return Some(RuleMatch { rule, confirmed })
            }
        }
        None
    }
}

impl Default for GeometryLetterClassifier {
    fn default() -> Self {
        Self::new(GeometryConfig::new())
    }
}
