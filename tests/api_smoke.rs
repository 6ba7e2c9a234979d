//! Compile-time smoke test: verify top-level re-exports work.

use mseed_detide::tide::{Constituent, HarmonicPredictor, MAX_CONSTITUENTS, TidePredictor};
use mseed_detide::{
    BTime, ByteOrder, ConfigError, DetideError, DetideParams, Detider, EncodingFormat, Input,
    MseedError, MseedReader, MseedRecord, MseedStream, NanoTime, Packed, Result, RunSummary,
    SampleType, Samples, Skip, SourceStats, TraceGroup, decode, encode, pack,
};

#[test]
fn top_level_imports_compile() {
    // Just verify the types are usable from the crate root
    let _: fn(&[u8]) -> Result<MseedRecord> = decode;
    let _: fn(&MseedRecord) -> Result<Vec<u8>> = encode;
    let _: fn(&MseedRecord) -> Result<Vec<Vec<u8>>> = pack;

    let _bo = ByteOrder::Big;
    let _s = Samples::Int(vec![]);
    let _st = SampleType::Int32;
    let _bt = BTime {
        year: 2025,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
        fract: 0,
    };
    let _nt = NanoTime::epoch();
    let _enc = EncodingFormat::Steim1;
    let _reader = MseedReader::new(&[]);
    let _stream = MseedStream::new(std::io::empty());
    let _group = TraceGroup::new();
    let _packed = Packed::default();

    let _params = DetideParams::default();
    let _detider = Detider::new(DetideParams::default(), HarmonicPredictor);
    let _input = Input::Stdin;
    let _summary = RunSummary::default();
    let _stats = SourceStats::default();
    let _skip = Skip::ZeroRate;
    let _c = Constituent::new("M2", 1.0, 0.0);
    assert_eq!(MAX_CONSTITUENTS, 32);
    let _h = HarmonicPredictor.height(&[], 0.0, 0.0, 0.0);

    // Error types are accessible
    let _e: Option<MseedError> = None;
    let _d: Option<DetideError> = None;
    let _c: Option<ConfigError> = None;
}
