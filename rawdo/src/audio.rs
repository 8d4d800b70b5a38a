use anyhow::{bail, Context, Result};
use librawdo::{AudioDescriptor, OUTPUT_SAMPLE_WIDTH};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, SampleBuffer, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Raw sample bytes of a decoded audio file
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub descriptor: AudioDescriptor,
    /// Interleaved samples. 8-bit PCM keeps its unsigned bytes, anything else
    /// is 16-bit little-endian.
    pub data: Vec<u8>,
}

/// Read an audio file into raw interleaved sample bytes
pub fn read_audio_file(path: &Path) -> Result<DecodedAudio> {
    let file = std::fs::File::open(path).context("Failed to open audio file")?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    read_from_source(mss, path.extension().and_then(|e| e.to_str()))
}

/// Read audio from bytes
pub fn read_audio_from_bytes(bytes: &[u8]) -> Result<DecodedAudio> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());
    read_from_source(mss, None)
}

fn read_from_source(mss: MediaSourceStream, extension: Option<&str>) -> Result<DecodedAudio> {
    // Create hint from file extension
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    // Probe the format
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unsupported audio format")?;

    let mut format = probed.format;

    // Find the first audio track
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Unknown sample rate")?;
    let channels = track
        .codec_params
        .channels
        .context("Unknown channel count")?
        .count();
    let channels = u8::try_from(channels).context("Too many channels")?;
    if channels == 0 {
        bail!("No audio channels");
    }

    // Create decoder
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut data = Vec::new();
    let mut sample_width = None;

    // Decode all packets
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(e) => return Err(e).context("Error reading packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e).context("Error decoding packet"),
        };

        let width = append_raw(decoded, &mut data, channels as usize);
        sample_width.get_or_insert(width);
    }

    let Some(sample_width) = sample_width.filter(|_| !data.is_empty()) else {
        bail!("No audio samples decoded");
    };

    let frames = data.len() as u64 / (channels as u64 * sample_width as u64);
    Ok(DecodedAudio {
        descriptor: AudioDescriptor {
            sample_rate,
            channels,
            sample_width,
            frames,
        },
        data,
    })
}

/// Append interleaved sample bytes, returning the bytes per sample used
fn append_raw(buffer: AudioBufferRef, data: &mut Vec<u8>, channels: usize) -> u8 {
    match buffer {
        AudioBufferRef::U8(buf) => {
            for frame in 0..buf.frames() {
                for ch in 0..channels {
                    data.push(buf.chan(ch)[frame]);
                }
            }
            1
        }
        other => {
            let mut samples = SampleBuffer::<i16>::new(other.capacity() as u64, *other.spec());
            samples.copy_interleaved_ref(other);
            for sample in samples.samples() {
                data.extend_from_slice(&sample.to_le_bytes());
            }
            2
        }
    }
}

/// Write raw bytes as 8-bit PCM. Only WAV is supported.
pub fn write_audio_file(
    path: &Path,
    data: &[u8],
    sample_rate: u32,
    channels: u8,
) -> Result<AudioDescriptor> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("wav") => {}
        Some(other) => bail!("Unsupported audio output format: .{}", other),
        None => bail!("Output file has no extension"),
    }

    let writer = hound::WavWriter::create(path, wav_spec(sample_rate, channels))
        .context("Failed to create WAV file")?;
    write_samples(writer, data)?;

    Ok(AudioDescriptor::from_byte_len(
        sample_rate,
        channels,
        data.len() as u64,
    ))
}

/// Write raw bytes as an 8-bit PCM WAV in memory
pub fn write_wav_to_bytes(data: &[u8], sample_rate: u32, channels: u8) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    let writer = hound::WavWriter::new(&mut cursor, wav_spec(sample_rate, channels))
        .context("Failed to start WAV data")?;
    write_samples(writer, data)?;
    Ok(cursor.into_inner())
}

fn wav_spec(sample_rate: u32, channels: u8) -> hound::WavSpec {
    hound::WavSpec {
        channels: channels as u16,
        sample_rate,
        bits_per_sample: OUTPUT_SAMPLE_WIDTH as u16 * 8,
        sample_format: hound::SampleFormat::Int,
    }
}

fn write_samples<W: std::io::Write + std::io::Seek>(
    mut writer: hound::WavWriter<W>,
    data: &[u8],
) -> Result<()> {
    // 8-bit WAV is unsigned; hound takes signed samples and adds the offset
    for &byte in data {
        writer
            .write_sample((byte ^ 0x80) as i8)
            .context("Failed to write sample")?;
    }
    writer.finalize().context("Failed to finalize WAV file")
}
