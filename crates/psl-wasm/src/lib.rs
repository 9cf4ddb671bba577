//! WebAssembly bindings for the Public Suffix List engine
//!
//! Queries run against the data passed to [`init`], or against the
//! built-in list until then.

use std::sync::OnceLock;

use psl_core::{Psl, SuffixType};
use wasm_bindgen::prelude::*;

static PSL_STATE: OnceLock<Psl> = OnceLock::new();

fn context() -> &'static Psl {
    PSL_STATE.get().unwrap_or_else(|| Psl::builtin())
}

fn load(data: &[u8]) -> Result<Psl, String> {
    Psl::load_bytes(data).map_err(|e| format!("Failed to load PSL data: {}", e))
}

fn suffix_type(name: Option<&str>) -> Result<SuffixType, String> {
    match name {
        None => Ok(SuffixType::ANY),
        Some(name) => SuffixType::from_cli_name(name).ok_or_else(|| format!("Unknown suffix type '{}'", name)),
    }
}

/// Load list text or a compiled DAFSA graph. Only the first call succeeds.
#[wasm_bindgen]
pub fn init(data: &[u8]) -> Result<(), JsValue> {
    if PSL_STATE.get().is_some() {
        return Err(JsValue::from_str("Already initialized. Reload the page to reinitialize."));
    }

    let psl = load(data).map_err(|e| JsValue::from_str(&e))?;

    PSL_STATE
        .set(psl)
        .map_err(|_| JsValue::from_str("Failed to set PSL state"))?;

    Ok(())
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    PSL_STATE.get().is_some()
}

#[wasm_bindgen]
pub fn get_info() -> JsValue {
    let psl = context();
    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&result, &"initialized".into(), &JsValue::from(is_initialized()));
    let _ = js_sys::Reflect::set(&result, &"representation".into(), &JsValue::from(psl.representation()));
    let _ = js_sys::Reflect::set(&result, &"suffixes".into(), &JsValue::from(psl.suffix_count() as u32));
    let _ = js_sys::Reflect::set(&result, &"exceptions".into(), &JsValue::from(psl.exception_count() as u32));
    let _ = js_sys::Reflect::set(&result, &"wildcards".into(), &JsValue::from(psl.wildcard_count() as u32));
    result.into()
}

/// `suffix_type` is one of `any` (default), `icann` or `private`.
#[wasm_bindgen]
pub fn is_public_suffix(domain: Option<String>, suffix_type: Option<String>) -> Result<bool, JsValue> {
    let filter = self::suffix_type(suffix_type.as_deref()).map_err(|e| JsValue::from_str(&e))?;
    Ok(query_public_suffix(domain.as_deref(), filter))
}

fn query_public_suffix(domain: Option<&str>, filter: SuffixType) -> bool {
    let domain = domain.map(psl_core::to_lowercase);
    psl_core::is_public_suffix_with(Some(context()), domain.as_deref(), filter)
}

#[wasm_bindgen]
pub fn registrable_domain(domain: Option<String>) -> Option<String> {
    let domain = psl_core::to_lowercase(&domain?);
    context().registrable_domain(&domain).map(str::to_string)
}

#[wasm_bindgen]
pub fn unregistrable_domain(domain: Option<String>) -> Option<String> {
    let domain = psl_core::to_lowercase(&domain?);
    context().unregistrable_domain(&domain).map(str::to_string)
}

#[wasm_bindgen]
pub fn is_cookie_domain_acceptable(hostname: Option<String>, cookie_domain: Option<String>) -> bool {
    let hostname = hostname.map(|h| psl_core::to_lowercase(&h));
    let cookie_domain = cookie_domain.map(|c| psl_core::to_lowercase(&c));
    psl_core::is_cookie_domain_acceptable(Some(context()), hostname.as_deref(), cookie_domain.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_fall_back_to_builtin() {
        assert!(!is_initialized());
        assert!(query_public_suffix(Some("co.uk"), SuffixType::ANY));
        assert!(!query_public_suffix(Some("Example.CO.UK"), SuffixType::ANY));
        assert!(query_public_suffix(None, SuffixType::ANY));
        assert_eq!(
            registrable_domain(Some("www.Example.co.uk".to_string())),
            Some("example.co.uk".to_string())
        );
        assert_eq!(unregistrable_domain(Some("www.example.com".to_string())), Some("com".to_string()));
        assert_eq!(registrable_domain(None), None);
    }

    #[test]
    fn cookie_domain_checks() {
        assert!(is_cookie_domain_acceptable(
            Some("www.example.com".to_string()),
            Some(".example.com".to_string())
        ));
        assert!(!is_cookie_domain_acceptable(
            Some("www.example.com".to_string()),
            Some("com".to_string())
        ));
        assert!(!is_cookie_domain_acceptable(None, Some("com".to_string())));
    }

    #[test]
    fn suffix_type_names() {
        assert_eq!(suffix_type(None), Ok(SuffixType::ANY));
        assert_eq!(suffix_type(Some("private")), Ok(SuffixType::PRIVATE));
        assert!(suffix_type(Some("all")).is_err());
    }

    #[test]
    fn load_rejects_bad_graph() {
        assert!(load(b".DAFSA@PSL_7   \n\x81").is_err());
        let psl = load(b"// ===BEGIN ICANN DOMAINS===\nexample\n").unwrap();
        assert!(psl.is_public_suffix("example"));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn init_once() {
        init(b"// ===BEGIN ICANN DOMAINS===\nexample\n").unwrap();
        assert!(is_initialized());
        assert!(init(b"com\n").is_err());
        assert_eq!(is_public_suffix(Some("example".to_string()), None), Ok(true));
        assert!(is_public_suffix(Some("example".to_string()), Some("bogus".to_string())).is_err());
    }
}
