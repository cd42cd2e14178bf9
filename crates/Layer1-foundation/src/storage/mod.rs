//! Storage - 설정 파일 저장소
//!
//! 캐시 자체는 메모리 전용. 디스크에서 읽는 것은 JSON 설정 파일뿐.

mod json;

pub use json::JsonStore;
pub(crate) use json::read_json;
