//! Event mix emitted by `trace-gen`
use trcstream_recorder::prelude::*;

/// Emits the `index`-th event of a worker out of `events`.
pub fn emit_sample(
    recorder: &Recorder,
    name: &str,
    index: u32,
    events: u32,
) -> Result<EncodeOutcome> {
    match index % 6 {
        0 => recorder.printf("%s iteration %u", &[name.into(), index.into()]),
        1 => {
            let celsius = 20 - (index % 40) as i32;
            recorder.printf("temperature %d C", &[celsius.into()])
        }
        2 => {
            let ratio = index as f32 / events.max(1) as f32;
            recorder.printf("ratio %f", &[ratio.into()])
        }
        3 => {
            let flags = index.wrapping_mul(7);
            recorder.printf("flags 0x%x mode %c", &[flags.into(), 'A'.into()])
        }
        4 => recorder.printf("100%% done on %s", &[name.into()]),
        _ => recorder.printf("heartbeat", &[]),
    }
}
