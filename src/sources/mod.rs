pub mod article;
pub mod douyin;
