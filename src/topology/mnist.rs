use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use rand::Rng;

use super::{Topology, random_layers};
use crate::{
    arch::Layer,
    data::{
        DataPoint, Dataset,
        idx::{parse_images, parse_labels},
    },
    error::{Result, TrainErr},
};

/// Side length of an MNIST image.
pub const IMAGE_SIDE: usize = 28;

/// Amount of digit classes.
pub const CLASSES: usize = 10;

const HIDDEN: usize = 300;

const TRAIN_IMAGES: &str = "train-images.idx3-ubyte";
const TRAIN_LABELS: &str = "train-labels.idx1-ubyte";
const TEST_IMAGES: &str = "t10k-images.idx3-ubyte";
const TEST_LABELS: &str = "t10k-labels.idx1-ubyte";

/// The 784-300-10 handwritten digit classifier, reading the IDX files under `data_root`.
#[derive(Debug, Clone)]
pub struct MnistTopology {
    data_root: PathBuf,
}

impl MnistTopology {
    /// Creates a new `MnistTopology`.
    ///
    /// # Arguments
    /// * `data_root` - The directory holding the `train-*` and, optionally, `t10k-*`
    ///   IDX files.
    pub fn new<P: Into<PathBuf>>(data_root: P) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    #[inline]
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    fn load_set(&self, images: &str, labels: &str) -> Result<Dataset> {
        let images = fs::read(self.data_root.join(images))?;
        let labels = fs::read(self.data_root.join(labels))?;
        dataset_from_idx(&images, &labels)
    }
}

/// Decodes a pair of IDX image and label files into one-hot labelled examples.
///
/// # Errors
/// `MalformedData` if either file is malformed, their counts differ, the images
/// aren't 28x28 or a label isn't a digit.
pub fn dataset_from_idx(images: &[u8], labels: &[u8]) -> Result<Dataset> {
    let images = parse_images(images)?;
    let labels = parse_labels(labels)?;

    if images.pixels.len() != labels.len() {
        return Err(TrainErr::malformed(
            "mnist data",
            format!(
                "{} images but {} labels",
                images.pixels.len(),
                labels.len()
            ),
        ));
    }

    if (images.rows, images.cols) != (IMAGE_SIDE, IMAGE_SIDE) {
        return Err(TrainErr::malformed(
            "mnist data",
            format!("images are {}x{}", images.rows, images.cols),
        ));
    }

    images
        .pixels
        .into_iter()
        .zip(labels)
        .map(|(input, label)| {
            let label = label as usize;
            if label >= CLASSES {
                return Err(TrainErr::malformed("mnist data", format!("label {label}")));
            }
            Ok(DataPoint::labeled(input, label, CLASSES))
        })
        .collect::<Result<Vec<_>>>()
        .map(Dataset::new)
}

impl Topology for MnistTopology {
    fn build<R: Rng>(&self, rng: &mut R) -> Result<Vec<Layer>> {
        random_layers(rng, &[IMAGE_SIDE * IMAGE_SIDE, HIDDEN, CLASSES])
    }

    fn load_data(&self) -> Result<(Dataset, Dataset)> {
        let train = self.load_set(TRAIN_IMAGES, TRAIN_LABELS)?;

        let test = match self.load_set(TEST_IMAGES, TEST_LABELS) {
            Err(TrainErr::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                warn!("no test set found under {}", self.data_root.display());
                Dataset::default()
            }
            res => res?,
        };

        debug!(train = train.len(), test = test.len(); "mnist data loaded");
        Ok((train, test))
    }
}
