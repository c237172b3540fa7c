pub mod clock;
pub mod pcm;
