// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use orrery_core::renderer::{ImageLayer, LayerPixels, LayeredTexture};
use orrery_io::{push_image, save_png};

fn checker(width: u32, height: u32) -> LayeredTexture {
    let pixels = (0..width * height)
        .flat_map(|i| {
            let on = (i % width + i / width) % 2 == 0;
            let v = if on { 255 } else { 0 };
            [v, v, v, 255]
        })
        .collect();
    let mut texture = LayeredTexture::new(4).unwrap();
    texture
        .push_layer(ImageLayer::new(width, height, 4, LayerPixels::Ldr(pixels)).unwrap(), false)
        .unwrap();
    texture
}

#[test]
fn saved_layer_reloads_with_same_shape_and_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let original = checker(5, 3);

    let written = save_png(&original, dir.path().join("checker")).unwrap();
    let mut reloaded = LayeredTexture::new(0).unwrap();
    push_image(&mut reloaded, &written[0], false).unwrap();

    let (a, b) = (&original.layers()[0], &reloaded.layers()[0]);
    assert_eq!(a.shape(), b.shape());
    assert_eq!(a.pixels(), b.pixels());
}

#[test]
fn flipping_on_load_reverses_rows() {
    let dir = tempfile::tempdir().unwrap();
    let original = checker(2, 3);
    let written = save_png(&original, dir.path().join("checker")).unwrap();

    let mut flipped = LayeredTexture::new(4).unwrap();
    push_image(&mut flipped, &written[0], true).unwrap();

    let mut expected = original.layers()[0].clone();
    expected.flip_vertically();
    assert_eq!(flipped.layers()[0].pixels(), expected.pixels());
}
