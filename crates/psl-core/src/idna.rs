//! IDNA conversion strategies.
//!
//! Rule sets compiled in ASCII mode only contain punycode keys, so
//! non-ASCII input has to be converted before lookup. The conversion is
//! pluggable; the default is a self-contained RFC 3492 encoder applied label
//! by label.

/// Converts a lowercase UTF-8 domain into its ASCII form.
pub trait IdnaConverter: Send + Sync {
    /// Returns `None` if the domain cannot be converted.
    fn to_ascii(&self, domain: &str) -> Option<String>;
}

/// Selects one of the built-in converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdnaMode {
    /// Per-label punycode with the `xn--` prefix
    #[default]
    Punycode,
    /// No conversion; non-ASCII domains are matched as raw bytes
    Disabled,
    /// UTS#46 processing through the `url` crate
    #[cfg(feature = "url-idna")]
    Uts46,
}

impl IdnaMode {
    pub fn converter(self) -> Box<dyn IdnaConverter> {
        match self {
            Self::Punycode => Box::new(Punycode),
            Self::Disabled => Box::new(NoIdna),
            #[cfg(feature = "url-idna")]
            Self::Uts46 => Box::new(UrlIdna),
        }
    }
}

// =============================================================================
// Converters
// =============================================================================

/// Built-in punycode converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Punycode;

impl IdnaConverter for Punycode {
    fn to_ascii(&self, domain: &str) -> Option<String> {
        let mut out = String::with_capacity(domain.len() + 8);
        for (i, label) in domain.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }
            if label.is_ascii() {
                out.push_str(label);
            } else {
                out.push_str(ACE_PREFIX);
                out.push_str(&encode(label)?);
            }
        }
        Some(out)
    }
}

/// Converter that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdna;

impl IdnaConverter for NoIdna {
    fn to_ascii(&self, _domain: &str) -> Option<String> {
        None
    }
}

/// UTS#46 converter backed by the `url` crate.
#[cfg(feature = "url-idna")]
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlIdna;

#[cfg(feature = "url-idna")]
impl IdnaConverter for UrlIdna {
    fn to_ascii(&self, domain: &str) -> Option<String> {
        match url::Host::parse(domain).ok()? {
            url::Host::Domain(ascii) => Some(ascii),
            _ => None,
        }
    }
}

// =============================================================================
// RFC 3492 Bootstring encoder
// =============================================================================

const ACE_PREFIX: &str = "xn--";

const BASE: u32 = 36;
const T_MIN: u32 = 1;
const T_MAX: u32 = 26;
const SKEW: u32 = 38;
const DAMP: u32 = 700;
const INITIAL_BIAS: u32 = 72;
const INITIAL_N: u32 = 128;

fn adapt(mut delta: u32, num_points: u32, first_time: bool) -> u32 {
    delta /= if first_time { DAMP } else { 2 };
    delta += delta / num_points;
    let mut k = 0;
    while delta > ((BASE - T_MIN) * T_MAX) / 2 {
        delta /= BASE - T_MIN;
        k += BASE;
    }
    k + (BASE - T_MIN + 1) * delta / (delta + SKEW)
}

fn encode_digit(d: u32) -> char {
    // 0..25 -> 'a'..'z', 26..35 -> '0'..'9'
    let b = if d < 26 { b'a' + d as u8 } else { b'0' + (d - 26) as u8 };
    b as char
}

/// Encode one label without the ACE prefix.
///
/// Returns `None` on arithmetic overflow.
pub fn encode(label: &str) -> Option<String> {
    let input: Vec<u32> = label.chars().map(u32::from).collect();
    let mut output: String = label.chars().filter(char::is_ascii).collect();

    let basic = output.len() as u32;
    let mut handled = basic;
    if basic > 0 {
        output.push('-');
    }

    let mut n = INITIAL_N;
    let mut delta: u32 = 0;
    let mut bias = INITIAL_BIAS;
    let total = input.len() as u32;

    while handled < total {
        let m = input.iter().copied().filter(|&c| c >= n).min()?;
        delta = delta.checked_add((m - n).checked_mul(handled + 1)?)?;
        n = m;

        for &c in &input {
            if c < n {
                delta = delta.checked_add(1)?;
            }
            if c == n {
                let mut q = delta;
                let mut k = BASE;
                loop {
                    let t = if k <= bias {
                        T_MIN
                    } else if k >= bias + T_MAX {
                        T_MAX
                    } else {
                        k - bias
                    };
                    if q < t {
                        break;
                    }
                    output.push(encode_digit(t + (q - t) % (BASE - t)));
                    q = (q - t) / (BASE - t);
                    k += BASE;
                }
                output.push(encode_digit(q));
                bias = adapt(delta, handled + 1, handled == basic);
                delta = 0;
                handled += 1;
            }
        }

        delta = delta.checked_add(1)?;
        n = n.checked_add(1)?;
    }

    Some(output)
}
